//! Deterministic in-process engine.
//!
//! `ScriptedEngine` does not model vehicle dynamics. It replays per-lane counts
//! from a [`CountProfile`] at every tick, keeps a journal of the mutating calls
//! it received, and can be told to fail. Tests and demos drive the environment
//! through it in place of a real simulator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::distributions::{Distribution, Uniform};

use super::{EngineResult, LaneCounts, TrafficEngine};
use crate::utils::rng::{rng_from_seed, RngStream};

/// Counts reported for one lane at one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaneSample {
    pub vehicles: u32,
    pub waiting: u32,
}

impl LaneSample {
    pub fn new(vehicles: u32, waiting: u32) -> Self { Self { vehicles, waiting } }
}

/// Source of per-lane counts.
pub enum CountProfile {
    /// Every lane reports the same sample at every tick (including tick 0).
    Constant(LaneSample),
    /// `f(tick, lane_index)`; evaluated at tick 0 on reset as well.
    Scripted(Box<dyn Fn(u64, usize) -> LaneSample + Send + Sync>),
    /// Seeded uniform noise: vehicles in `[0, max_vehicles]`, waiting in `[0, vehicles]`.
    /// The network starts empty at tick 0.
    Uniform { seed: u64, max_vehicles: u32 },
}

impl std::fmt::Debug for CountProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountProfile::Constant(s) => f.debug_tuple("Constant").field(s).finish(),
            CountProfile::Scripted(_) => f.write_str("Scripted(..)"),
            CountProfile::Uniform { seed, max_vehicles } => f
                .debug_struct("Uniform")
                .field("seed", seed)
                .field("max_vehicles", max_vehicles)
                .finish(),
        }
    }
}

/// A mutating call received by the engine, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    SetPhase { intersection_id: String, phase: u32 },
    NextStep,
    Reset,
}

/// Faults raised by [`ScriptedEngine`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptedEngineError {
    #[error("unknown intersection id: {0}")]
    UnknownIntersection(String),
    #[error("phase {phase} out of range for {intersection_id} ({phase_count} phases)")]
    PhaseOutOfRange { intersection_id: String, phase: u32, phase_count: u32 },
    #[error("injected engine fault: {0}")]
    Injected(String),
}

pub struct ScriptedEngine {
    lanes: Vec<String>,
    profile: CountProfile,
    rng: RngStream,

    intersections: Vec<String>,
    phase_count: u32,
    interval: f64,

    tick: u64,
    samples: Vec<LaneSample>,
    phases: HashMap<String, u32>,
    journal: Vec<EngineCall>,
    pending_fault: Option<String>,

    scenario_path: Option<PathBuf>,
    thread_count: usize,
}

impl ScriptedEngine {
    /// Engine reporting `lanes` with counts from `profile`, controlling a single
    /// intersection `intersection_1_1` with 9 phases and a 1 s interval.
    pub fn new<I, S>(lanes: I, profile: CountProfile) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lanes: Vec<String> = lanes.into_iter().map(Into::into).collect();
        let seed = match &profile { CountProfile::Uniform { seed, .. } => *seed, _ => 0 };
        let mut engine = Self {
            samples: vec![LaneSample::default(); lanes.len()],
            lanes,
            profile,
            rng: rng_from_seed(seed),
            intersections: vec!["intersection_1_1".to_string()],
            phase_count: 9,
            interval: 1.0,
            tick: 0,
            phases: HashMap::new(),
            journal: Vec::new(),
            pending_fault: None,
            scenario_path: None,
            thread_count: 1,
        };
        engine.load_initial();
        engine
    }

    /// Engine over the default 1x1 lane set.
    pub fn single_intersection(profile: CountProfile) -> Self {
        Self::new(crate::envs::cityflow::DEFAULT_LANE_IDS, profile)
    }

    pub fn with_intersection<S: Into<String>>(mut self, id: S) -> Self {
        self.intersections = vec![id.into()];
        self
    }

    pub fn with_phase_count(mut self, n: u32) -> Self {
        self.phase_count = n;
        self
    }

    /// Seconds of simulated time per `next_step`.
    pub fn with_interval(mut self, seconds: f64) -> Self {
        self.interval = seconds;
        self
    }

    /// Remember which scenario and thread count this engine was connected with.
    pub fn with_scenario<P: AsRef<Path>>(mut self, path: P, thread_count: usize) -> Self {
        self.scenario_path = Some(path.as_ref().to_path_buf());
        self.thread_count = thread_count;
        self
    }

    /// Make the next `next_step` call fail with `message`.
    pub fn fail_next_step<S: Into<String>>(&mut self, message: S) {
        self.pending_fault = Some(message.into());
    }

    pub fn journal(&self) -> &[EngineCall] { &self.journal }
    pub fn clear_journal(&mut self) { self.journal.clear(); }
    pub fn tick(&self) -> u64 { self.tick }
    pub fn lanes(&self) -> &[String] { &self.lanes }
    pub fn phase_of(&self, intersection_id: &str) -> Option<u32> { self.phases.get(intersection_id).copied() }
    pub fn scenario_path(&self) -> Option<&Path> { self.scenario_path.as_deref() }
    pub fn thread_count(&self) -> usize { self.thread_count }

    fn load_initial(&mut self) {
        if let CountProfile::Uniform { seed, .. } = self.profile {
            self.rng = rng_from_seed(seed);
        }
        self.tick = 0;
        self.phases.clear();
        self.samples = self.sample_tick(0);
    }

    fn sample_tick(&mut self, tick: u64) -> Vec<LaneSample> {
        let n = self.lanes.len();
        match &self.profile {
            CountProfile::Constant(s) => vec![*s; n],
            CountProfile::Scripted(f) => (0..n).map(|i| f(tick, i)).collect(),
            CountProfile::Uniform { max_vehicles, .. } => {
                if tick == 0 {
                    return vec![LaneSample::default(); n];
                }
                let vehicles = Uniform::from(0..=*max_vehicles);
                (0..n)
                    .map(|_| {
                        let v = vehicles.sample(&mut self.rng);
                        let w = Uniform::from(0..=v).sample(&mut self.rng);
                        LaneSample::new(v, w)
                    })
                    .collect()
            }
        }
    }

    fn report(&self, pick: impl Fn(&LaneSample) -> u32) -> LaneCounts {
        self.lanes
            .iter()
            .zip(self.samples.iter())
            .map(|(lane, s)| (lane.clone(), pick(s)))
            .collect()
    }
}

impl TrafficEngine for ScriptedEngine {
    fn next_step(&mut self) -> EngineResult<()> {
        self.journal.push(EngineCall::NextStep);
        if let Some(msg) = self.pending_fault.take() {
            return Err(Box::new(ScriptedEngineError::Injected(msg)));
        }
        self.tick += 1;
        self.samples = self.sample_tick(self.tick);
        Ok(())
    }

    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: u32) -> EngineResult<()> {
        self.journal.push(EngineCall::SetPhase { intersection_id: intersection_id.to_string(), phase: phase_index });
        if !self.intersections.iter().any(|i| i == intersection_id) {
            return Err(Box::new(ScriptedEngineError::UnknownIntersection(intersection_id.to_string())));
        }
        if phase_index >= self.phase_count {
            return Err(Box::new(ScriptedEngineError::PhaseOutOfRange {
                intersection_id: intersection_id.to_string(),
                phase: phase_index,
                phase_count: self.phase_count,
            }));
        }
        self.phases.insert(intersection_id.to_string(), phase_index);
        Ok(())
    }

    fn lane_vehicle_count(&self) -> EngineResult<LaneCounts> { Ok(self.report(|s| s.vehicles)) }

    fn lane_waiting_vehicle_count(&self) -> EngineResult<LaneCounts> { Ok(self.report(|s| s.waiting)) }

    fn reset(&mut self) -> EngineResult<()> {
        self.journal.push(EngineCall::Reset);
        self.pending_fault = None;
        self.load_initial();
        Ok(())
    }

    fn current_time(&self) -> EngineResult<f64> { Ok(self.tick as f64 * self.interval) }
}
