//! Gymnasium-style environment for a single CityFlow signalized intersection.
//!
//! An agent picks one of nine light phases per step; the environment forwards it to
//! a [`TrafficEngine`], advances simulated time by one interval and returns per-lane
//! vehicle/waiting counts as the observation and the negated waiting time as reward.

pub mod core;
pub mod config;
pub mod engine;
pub mod envs;
pub mod registry;
pub mod spaces;
pub mod utils;
pub mod wrappers;

pub use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, RenderMode, Result, Step};
pub use crate::config::CityFlowConfig;
pub use crate::engine::{EngineConnector, EngineError, LaneCounts, ScriptedEngine, TrafficEngine};
pub use crate::envs::{CityFlowEnv, EpisodePhase, EpisodeState, LaneSet, Observation};
pub use crate::envs::cityflow::{DEFAULT_LANE_IDS, LANE_COUNT, OBS_DIM, PHASE_COUNT};
pub use crate::registry::{EnvSpec, KwArgs, CITYFLOW_1X1_ID, cityflow_factory, cityflow_spec, get_spec, make, register, register_cityflow};
pub use crate::spaces::{BoxSpace, Discrete, Space};
pub use crate::wrappers::{RecordEpisodeStatistics, TimeLimit, TransformReward};
