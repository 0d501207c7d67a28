//! Capability boundary to the external microscopic traffic simulator.
//!
//! The environment never simulates traffic itself. It drives an engine through
//! [`TrafficEngine`] and derives everything it returns from the per-lane counts
//! the engine reports. Engines are bootstrapped elsewhere (see [`EngineConnector`]).

pub mod scripted;

use std::collections::HashMap;
use std::path::Path;

pub use scripted::{CountProfile, EngineCall, LaneSample, ScriptedEngine};

/// Opaque engine fault. Propagated to callers unmodified.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Per-lane counts keyed by lane identifier. Iteration order is unspecified.
pub type LaneCounts = HashMap<String, u32>;

/// Operations the environment consumes from a traffic engine.
///
/// All calls are synchronous and block until the engine answers.
pub trait TrafficEngine {
    /// Advance simulated time by one engine interval.
    fn next_step(&mut self) -> EngineResult<()>;

    /// Switch the signal of `intersection_id` to the phase at `phase_index`.
    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: u32) -> EngineResult<()>;

    /// Number of vehicles currently on each lane.
    fn lane_vehicle_count(&self) -> EngineResult<LaneCounts>;

    /// Number of waiting (halted) vehicles on each lane.
    fn lane_waiting_vehicle_count(&self) -> EngineResult<LaneCounts>;

    /// Restore the scenario's initial state.
    fn reset(&mut self) -> EngineResult<()>;

    /// Current simulated time in seconds.
    fn current_time(&self) -> EngineResult<f64>;
}

impl<E: TrafficEngine + ?Sized> TrafficEngine for &mut E {
    fn next_step(&mut self) -> EngineResult<()> { (**self).next_step() }
    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: u32) -> EngineResult<()> {
        (**self).set_tl_phase(intersection_id, phase_index)
    }
    fn lane_vehicle_count(&self) -> EngineResult<LaneCounts> { (**self).lane_vehicle_count() }
    fn lane_waiting_vehicle_count(&self) -> EngineResult<LaneCounts> { (**self).lane_waiting_vehicle_count() }
    fn reset(&mut self) -> EngineResult<()> { (**self).reset() }
    fn current_time(&self) -> EngineResult<f64> { (**self).current_time() }
}

impl<E: TrafficEngine + ?Sized> TrafficEngine for Box<E> {
    fn next_step(&mut self) -> EngineResult<()> { (**self).next_step() }
    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: u32) -> EngineResult<()> {
        (**self).set_tl_phase(intersection_id, phase_index)
    }
    fn lane_vehicle_count(&self) -> EngineResult<LaneCounts> { (**self).lane_vehicle_count() }
    fn lane_waiting_vehicle_count(&self) -> EngineResult<LaneCounts> { (**self).lane_waiting_vehicle_count() }
    fn reset(&mut self) -> EngineResult<()> { (**self).reset() }
    fn current_time(&self) -> EngineResult<f64> { (**self).current_time() }
}

/// Bootstraps an engine from a scenario config path and an engine thread count.
pub trait EngineConnector<E: TrafficEngine> {
    fn connect(&self, scenario_path: &Path, thread_count: usize) -> EngineResult<E>;
}

impl<E, F> EngineConnector<E> for F
where
    E: TrafficEngine,
    F: Fn(&Path, usize) -> EngineResult<E>,
{
    fn connect(&self, scenario_path: &Path, thread_count: usize) -> EngineResult<E> {
        self(scenario_path, thread_count)
    }
}
