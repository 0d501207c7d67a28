pub mod cityflow;

pub use cityflow::{CityFlowEnv, EpisodePhase, EpisodeState, LaneSet, Observation};
