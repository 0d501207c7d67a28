use crate::core::{GymError, Result};
use crate::engine::LaneCounts;

/// Number of monitored lanes at the 1x1 intersection.
pub const LANE_COUNT: usize = 8;

/// Observation length: a (vehicles, waiting) pair per monitored lane.
pub const OBS_DIM: usize = 2 * LANE_COUNT;

/// Lane identifiers of the 1x1 scenario, in observation order.
pub const DEFAULT_LANE_IDS: [&str; LANE_COUNT] = [
    "road_0_1_0",
    "road_1_0_1",
    "road_2_1_2",
    "road_1_2_3",
    "road_1_1_0",
    "road_1_1_1",
    "road_1_1_2",
    "road_1_1_3",
];

/// Observation vector: slot `2i` is the vehicle count and slot `2i + 1` the waiting
/// count of lane `i` of the [`LaneSet`].
pub type Observation = [f32; OBS_DIM];

/// Fixed, ordered set of monitored lanes.
///
/// Defines the slot layout of every observation and the filter applied to the
/// waiting counts when computing reward.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "[String; 8]", into = "[String; 8]")
)]
pub struct LaneSet {
    ids: [String; LANE_COUNT],
}

impl Default for LaneSet {
    fn default() -> Self {
        Self { ids: DEFAULT_LANE_IDS.map(String::from) }
    }
}

impl LaneSet {
    /// Build a lane set; identifiers must be non-empty and distinct.
    pub fn new<S: Into<String>>(ids: [S; LANE_COUNT]) -> Result<Self> {
        let set = Self { ids: ids.map(Into::into) };
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        for (i, id) in self.ids.iter().enumerate() {
            if id.is_empty() {
                return Err(GymError::InvalidConfig(format!("lane {i} has an empty id")));
            }
            if self.ids[..i].contains(id) {
                return Err(GymError::InvalidConfig(format!("duplicate lane id: {id}")));
            }
        }
        Ok(())
    }

    /// Parse a comma separated list of exactly eight lane ids.
    pub fn parse(list: &str) -> Result<Self> {
        let parts: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
        let ids: [String; LANE_COUNT] = parts.try_into().map_err(|p: Vec<String>| {
            GymError::InvalidConfig(format!("expected {LANE_COUNT} lane ids, got {}", p.len()))
        })?;
        Self::new(ids)
    }

    pub fn contains(&self, lane_id: &str) -> bool { self.ids.iter().any(|id| id == lane_id) }

    pub fn iter(&self) -> impl Iterator<Item = &str> { self.ids.iter().map(String::as_str) }

    pub fn as_slice(&self) -> &[String] { &self.ids }

    /// Interleave vehicle and waiting counts in lane-set order.
    ///
    /// Slots are filled by explicit lookup, so the engine's map order never leaks
    /// into the layout. A monitored lane missing from either report is an error.
    pub fn assemble(&self, vehicles: &LaneCounts, waiting: &LaneCounts) -> Result<Observation> {
        let mut obs = [0.0f32; OBS_DIM];
        for (i, id) in self.ids.iter().enumerate() {
            obs[2 * i] = lookup(vehicles, id, "vehicle")? as f32;
            obs[2 * i + 1] = lookup(waiting, id, "waiting vehicle")? as f32;
        }
        Ok(obs)
    }

    /// Sum of waiting counts over reported lanes that belong to this set.
    pub fn waiting_total(&self, waiting: &LaneCounts) -> u64 {
        waiting
            .iter()
            .filter(|(lane, _)| self.contains(lane))
            .map(|(_, &n)| n as u64)
            .sum()
    }
}

impl TryFrom<[String; LANE_COUNT]> for LaneSet {
    type Error = GymError;

    fn try_from(ids: [String; LANE_COUNT]) -> Result<Self> { Self::new(ids) }
}

impl From<LaneSet> for [String; LANE_COUNT] {
    fn from(set: LaneSet) -> Self { set.ids }
}

fn lookup(counts: &LaneCounts, lane: &str, what: &str) -> Result<u32> {
    counts
        .get(lane)
        .copied()
        .ok_or_else(|| GymError::InvalidObservation(format!("engine reported no {what} count for lane {lane}")))
}
