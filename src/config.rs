//! Construction-time configuration for [`CityFlowEnv`](crate::envs::CityFlowEnv).
//!
//! Defaults reproduce the 1x1 low-traffic scenario: one intersection, eight
//! monitored lanes, 1500 steps of one simulated second each.

use std::path::PathBuf;
use std::str::FromStr;

use crate::core::{GymError, Result};
use crate::envs::cityflow::LaneSet;
use crate::registry::KwArgs;

pub const DEFAULT_SCENARIO_PATH: &str = "1x1_config/config.json";
pub const DEFAULT_INTERSECTION_ID: &str = "intersection_1_1";
pub const DEFAULT_STEPS_PER_EPISODE: u32 = 1500;
pub const DEFAULT_SECONDS_PER_STEP: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CityFlowConfig {
    /// Engine config file describing the road network and vehicle flows.
    pub scenario_path: PathBuf,
    /// Worker threads the engine may use internally.
    pub thread_count: usize,
    pub steps_per_episode: u32,
    /// Simulated seconds covered by one `step`; scales the reward.
    pub seconds_per_step: f32,
    /// Intersection whose signal the agent controls.
    pub intersection_id: String,
    pub lanes: LaneSet,
    /// Keep `current_step` across `reset` instead of restarting it at zero.
    /// With this set, an episode started by `reset` after a terminated one
    /// never reaches the termination boundary again.
    pub carry_step_count_across_reset: bool,
}

impl Default for CityFlowConfig {
    fn default() -> Self {
        Self {
            scenario_path: PathBuf::from(DEFAULT_SCENARIO_PATH),
            thread_count: 1,
            steps_per_episode: DEFAULT_STEPS_PER_EPISODE,
            seconds_per_step: DEFAULT_SECONDS_PER_STEP,
            intersection_id: DEFAULT_INTERSECTION_ID.to_string(),
            lanes: LaneSet::default(),
            carry_step_count_across_reset: false,
        }
    }
}

impl CityFlowConfig {
    pub fn with_scenario_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.scenario_path = path.into();
        self
    }

    pub fn with_thread_count(mut self, n: usize) -> Self {
        self.thread_count = n;
        self
    }

    pub fn with_steps_per_episode(mut self, n: u32) -> Self {
        self.steps_per_episode = n;
        self
    }

    pub fn with_seconds_per_step(mut self, s: f32) -> Self {
        self.seconds_per_step = s;
        self
    }

    pub fn with_lanes(mut self, lanes: LaneSet) -> Self {
        self.lanes = lanes;
        self
    }

    pub fn with_carry_step_count_across_reset(mut self, carry: bool) -> Self {
        self.carry_step_count_across_reset = carry;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(GymError::InvalidConfig("thread_count must be at least 1".into()));
        }
        // Termination fires when current_step + 1 == steps_per_episode with
        // current_step >= 1, so shorter episodes never end.
        if self.steps_per_episode < 2 {
            return Err(GymError::InvalidConfig(format!(
                "steps_per_episode must be at least 2, got {}",
                self.steps_per_episode
            )));
        }
        if !self.seconds_per_step.is_finite() || self.seconds_per_step <= 0.0 {
            return Err(GymError::InvalidConfig(format!(
                "seconds_per_step must be a positive finite number, got {}",
                self.seconds_per_step
            )));
        }
        if self.intersection_id.is_empty() {
            return Err(GymError::InvalidConfig("intersection_id must not be empty".into()));
        }
        self.lanes.validate()
    }

    /// Build a config from `make()` kwargs, starting from the defaults.
    ///
    /// Recognized keys: `scenario_path`, `thread_count`, `steps_per_episode`,
    /// `seconds_per_step`, `intersection_id`, `lanes` (comma separated) and
    /// `carry_step_count_across_reset`.
    pub fn from_kwargs(kwargs: &KwArgs) -> Result<Self> {
        let mut cfg = Self::default();
        for (key, value) in kwargs {
            match key.as_str() {
                "scenario_path" => cfg.scenario_path = PathBuf::from(value),
                "thread_count" => cfg.thread_count = parse_kwarg(key, value)?,
                "steps_per_episode" => cfg.steps_per_episode = parse_kwarg(key, value)?,
                "seconds_per_step" => cfg.seconds_per_step = parse_kwarg(key, value)?,
                "intersection_id" => cfg.intersection_id = value.clone(),
                "lanes" => cfg.lanes = LaneSet::parse(value)?,
                "carry_step_count_across_reset" => cfg.carry_step_count_across_reset = parse_kwarg(key, value)?,
                other => return Err(GymError::InvalidConfig(format!("unknown option: {other}"))),
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_kwarg<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GymError::InvalidConfig(format!("{key}={value:?}: {e}")))
}
