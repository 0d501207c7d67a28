//! Single signalized intersection driven by an external traffic engine.

pub mod lanes;

pub use lanes::{LaneSet, Observation, DEFAULT_LANE_IDS, LANE_COUNT, OBS_DIM};

use tracing::{debug, info, warn};

use crate::config::CityFlowConfig;
use crate::core::{Env, GymError, Info, RenderFrame, RenderMode, Result, Step};
use crate::engine::{EngineConnector, TrafficEngine};
use crate::spaces::{BoxSpace, Discrete, Space};

/// Number of signal phases defined by the 1x1 scenario.
pub const PHASE_COUNT: u32 = 9;

/// Episode counters owned by the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpisodeState {
    pub current_step: u32,
    pub is_done: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodePhase {
    Active,
    Terminated,
}

/// CityFlow-1x1 environment.
///
/// Observation: `[f32; 16]`, (vehicles, waiting) per monitored lane in [`LaneSet`] order.
/// Action space: Discrete(9), the index of a light phase of the scenario's intersection.
/// Reward: `-seconds_per_step * total waiting vehicles` on monitored lanes.
/// Termination: `terminated` turns true on the step that brings `current_step` to
/// `steps_per_episode - 1`. `truncated` is always false.
///
/// Stepping past termination still drives the engine but yields zero reward and
/// logs a warning.
pub struct CityFlowEnv<E: TrafficEngine> {
    engine: E,
    config: CityFlowConfig,
    action_space: Discrete,
    observation_space: BoxSpace<f32, OBS_DIM>,
    state: EpisodeState,
}

impl<E: TrafficEngine> CityFlowEnv<E> {
    pub const METADATA: &'static [RenderMode] = &[RenderMode::Human];

    /// Bind to an engine already loaded with the scenario named in `config`.
    pub fn new(engine: E, config: CityFlowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            action_space: Discrete::new(PHASE_COUNT),
            observation_space: BoxSpace::new([0.0; OBS_DIM], [f32::INFINITY; OBS_DIM]),
            state: EpisodeState::default(),
        })
    }

    /// Bootstrap the engine from `config.scenario_path` and `config.thread_count`.
    pub fn connect<C: EngineConnector<E>>(config: CityFlowConfig, connector: &C) -> Result<Self> {
        config.validate()?;
        let engine = connector.connect(&config.scenario_path, config.thread_count)?;
        info!(
            scenario = %config.scenario_path.display(),
            threads = config.thread_count,
            intersection = %config.intersection_id,
            "connected traffic engine"
        );
        Self::new(engine, config)
    }

    pub fn config(&self) -> &CityFlowConfig { &self.config }
    pub fn engine(&self) -> &E { &self.engine }
    pub fn engine_mut(&mut self) -> &mut E { &mut self.engine }
    pub fn into_engine(self) -> E { self.engine }

    pub fn action_space(&self) -> &Discrete { &self.action_space }
    /// Observation bounds `[0, +inf)` per slot.
    pub fn observation_space(&self) -> &BoxSpace<f32, OBS_DIM> { &self.observation_space }

    pub fn state(&self) -> EpisodeState { self.state }
    pub fn current_step(&self) -> u32 { self.state.current_step }
    pub fn is_done(&self) -> bool { self.state.is_done }

    pub fn phase(&self) -> EpisodePhase {
        if self.state.is_done { EpisodePhase::Terminated } else { EpisodePhase::Active }
    }

    /// Render in the given mode. Human mode prints the simulated time to stdout.
    pub fn render_mode(&self, mode: RenderMode) -> Result<RenderFrame> {
        match mode {
            RenderMode::Human => {
                let line = format!("Current time: {}", self.engine.current_time()?);
                println!("{line}");
                Ok(RenderFrame::Text(line))
            }
        }
    }

    fn observe(&self) -> Result<Observation> {
        let vehicles = self.engine.lane_vehicle_count()?;
        let waiting = self.engine.lane_waiting_vehicle_count()?;
        self.config.lanes.assemble(&vehicles, &waiting)
    }

    fn reward(&self) -> Result<f32> {
        let waiting = self.engine.lane_waiting_vehicle_count()?;
        let total = self.config.lanes.waiting_total(&waiting);
        Ok(0.0 - self.config.seconds_per_step * total as f32)
    }

    fn validate_action(&self, action: i64) -> Result<u32> {
        u32::try_from(action)
            .ok()
            .filter(|a| self.action_space.contains(a))
            .ok_or_else(|| GymError::invalid_argument(&action))
    }
}

impl<E: TrafficEngine> Env for CityFlowEnv<E> {
    type Obs = Observation;
    type Act = i64;

    /// The scenario is deterministic from its initial state, so `seed` is unused.
    fn reset(&mut self, _seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.engine.reset()?;
        self.state.is_done = false;
        if !self.config.carry_step_count_across_reset {
            self.state.current_step = 0;
        }
        debug!(current_step = self.state.current_step, "episode reset");
        Ok((self.observe()?, Info::new()))
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let phase = self.validate_action(action)?;
        let stepped_past_done = self.state.is_done;

        self.engine.set_tl_phase(&self.config.intersection_id, phase)?;
        self.engine.next_step()?;

        let observation = self.observe()?;
        let mut reward = self.reward()?;

        self.state.current_step = self.state.current_step.saturating_add(1);

        if stepped_past_done {
            warn!(
                "step() called after this environment already returned terminated = true; \
                 call reset() once an episode ends, further steps are undefined"
            );
            reward = 0.0;
        }

        if self.state.current_step.saturating_add(1) == self.config.steps_per_episode {
            self.state.is_done = true;
            debug!(current_step = self.state.current_step, "episode terminated");
        }

        Ok(Step::new(observation, reward, self.state.is_done, false, Info::new()))
    }

    fn render(&self) -> Result<Option<RenderFrame>> {
        self.render_mode(RenderMode::Human).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CountProfile, EngineCall, LaneSample, ScriptedEngine};

    fn env_with(profile: CountProfile) -> CityFlowEnv<ScriptedEngine> {
        CityFlowEnv::new(ScriptedEngine::single_intersection(profile), CityFlowConfig::default()).unwrap()
    }

    #[test]
    fn declares_spaces() {
        let env = env_with(CountProfile::Constant(LaneSample::default()));
        assert_eq!(env.action_space().n(), 9);
        assert!(env.observation_space().contains(&[0.0; OBS_DIM]));
        assert!(!env.observation_space().contains(&[-1.0; OBS_DIM]));
        assert_eq!(env.state(), EpisodeState { current_step: 0, is_done: false });
        assert_eq!(CityFlowEnv::<ScriptedEngine>::METADATA, &[RenderMode::Human]);
    }

    #[test]
    fn observation_space_sampling_stays_in_bounds() {
        let env = env_with(CountProfile::Constant(LaneSample::default()));
        let mut rng = crate::utils::rng_from_seed(0);
        for _ in 0..100 {
            let obs = env.observation_space().sample(&mut rng);
            assert!(obs.iter().all(|x| x.is_finite() && *x >= 0.0));
            assert!(env.observation_space().contains(&obs));
        }
    }

    #[test]
    fn step_sets_phase_then_advances() {
        let mut env = env_with(CountProfile::Constant(LaneSample::new(3, 1)));
        env.reset(None).unwrap();
        env.engine_mut().clear_journal();

        let s = env.step(1).unwrap();
        assert_eq!(
            env.engine().journal(),
            &[
                EngineCall::SetPhase { intersection_id: "intersection_1_1".into(), phase: 1 },
                EngineCall::NextStep,
            ]
        );
        assert!(!s.terminated);
        assert!(!s.truncated);
        assert!(s.info.is_empty());
        assert_eq!(s.reward, -8.0);
        assert_eq!(s.observation, [3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0, 3.0, 1.0]);
        assert_eq!(env.current_step(), 1);
    }

    #[test]
    fn invalid_action_is_rejected_before_any_engine_call() {
        let mut env = env_with(CountProfile::Constant(LaneSample::new(1, 1)));
        for bad in [-1i64, 9, 10, i64::MAX, i64::MIN] {
            let err = env.step(bad).unwrap_err();
            match err {
                GymError::InvalidArgument { value, type_name } => {
                    assert_eq!(value, bad.to_string());
                    assert_eq!(type_name, "i64");
                }
                other => panic!("expected InvalidArgument, got {other:?}"),
            }
        }
        assert!(env.engine().journal().is_empty());
        assert_eq!(env.state(), EpisodeState::default());
        assert_eq!(GymError::invalid_argument(&9i64).to_string(), "9 (i64) invalid");
    }

    #[test]
    fn reward_scales_with_seconds_per_step() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(4, 2)));
        let mut env = CityFlowEnv::new(engine, CityFlowConfig::default().with_seconds_per_step(5.0)).unwrap();
        env.reset(None).unwrap();
        assert_eq!(env.step(0).unwrap().reward, -80.0);
    }

    #[test]
    fn zero_waiting_gives_positive_zero_reward() {
        let mut env = env_with(CountProfile::Constant(LaneSample::new(5, 0)));
        env.reset(None).unwrap();
        let r = env.step(2).unwrap().reward;
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn engine_faults_propagate_unchanged() {
        let mut env = env_with(CountProfile::Constant(LaneSample::default()));
        env.reset(None).unwrap();
        env.engine_mut().fail_next_step("physics diverged");
        let err = env.step(0).unwrap_err();
        assert!(matches!(err, GymError::Engine(_)));
        assert_eq!(err.to_string(), "injected engine fault: physics diverged");
        assert_eq!(env.current_step(), 0);

        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::default()));
        let cfg = CityFlowConfig { intersection_id: "intersection_2_2".into(), ..CityFlowConfig::default() };
        let mut env = CityFlowEnv::new(engine, cfg).unwrap();
        let err = env.step(0).unwrap_err();
        assert_eq!(err.to_string(), "unknown intersection id: intersection_2_2");
    }

    #[test]
    fn short_episode_terminates_one_step_early() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(1, 1)));
        let mut env = CityFlowEnv::new(engine, CityFlowConfig::default().with_steps_per_episode(4)).unwrap();
        env.reset(None).unwrap();
        assert!(!env.step(0).unwrap().terminated);
        assert!(!env.step(0).unwrap().terminated);
        assert_eq!(env.phase(), EpisodePhase::Active);
        let s = env.step(0).unwrap();
        assert!(s.terminated);
        assert!(s.reward < 0.0);
        assert_eq!(env.current_step(), 3);
        assert_eq!(env.phase(), EpisodePhase::Terminated);
    }

    #[test]
    fn stepping_after_termination_zeroes_reward_but_drives_engine() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(6, 6)));
        let mut env = CityFlowEnv::new(engine, CityFlowConfig::default().with_steps_per_episode(2)).unwrap();
        env.reset(None).unwrap();
        let last = env.step(0).unwrap();
        assert!(last.terminated);
        assert_eq!(last.reward, -48.0);

        let before = env.engine().current_time().unwrap();
        for _ in 0..3 {
            let s = env.step(4).unwrap();
            assert_eq!(s.reward, 0.0);
            assert!(s.terminated);
        }
        assert_eq!(env.engine().current_time().unwrap(), before + 3.0);
    }

    #[test]
    fn reset_returns_initial_counts_and_reactivates() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Uniform { seed: 5, max_vehicles: 9 });
        let mut env = CityFlowEnv::new(engine, CityFlowConfig::default().with_steps_per_episode(3)).unwrap();
        env.reset(None).unwrap();
        env.step(0).unwrap();
        assert!(env.step(0).unwrap().terminated);

        let (obs, info) = env.reset(None).unwrap();
        assert_eq!(obs, [0.0; OBS_DIM]);
        assert!(info.is_empty());
        assert_eq!(env.phase(), EpisodePhase::Active);
        assert_eq!(env.current_step(), 0);
        assert_eq!(env.engine().current_time().unwrap(), 0.0);
    }

    #[test]
    fn render_reports_simulated_time() {
        let mut env = env_with(CountProfile::Constant(LaneSample::default()));
        env.reset(None).unwrap();
        env.step(0).unwrap();
        env.step(0).unwrap();
        assert_eq!(env.render().unwrap(), Some(RenderFrame::Text("Current time: 2".into())));
    }

    #[test]
    fn render_uses_engine_interval() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::default())).with_interval(5.0);
        let mut env = CityFlowEnv::new(engine, CityFlowConfig::default().with_seconds_per_step(5.0)).unwrap();
        env.reset(None).unwrap();
        env.step(0).unwrap();
        env.step(0).unwrap();
        assert_eq!(env.render().unwrap(), Some(RenderFrame::Text("Current time: 10".into())));
    }

    #[test]
    fn drives_the_configured_intersection() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(2, 1)))
            .with_intersection("intersection_2_2")
            .with_phase_count(4);
        assert_eq!(engine.lanes().len(), LANE_COUNT);
        let cfg = CityFlowConfig { intersection_id: "intersection_2_2".into(), ..CityFlowConfig::default() };
        let mut env = CityFlowEnv::new(engine, cfg).unwrap();
        env.reset(None).unwrap();

        env.step(3).unwrap();
        assert_eq!(env.engine().phase_of("intersection_2_2"), Some(3));

        // within Discrete(9) but beyond what this engine's signal plan defines
        let err = env.step(7).unwrap_err();
        assert!(matches!(err, GymError::Engine(_)));
        assert_eq!(err.to_string(), "phase 7 out of range for intersection_2_2 (4 phases)");
        assert_eq!(env.current_step(), 1);
    }

    #[test]
    fn carried_step_counter_saturates() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(1, 1)));
        let cfg = CityFlowConfig::default().with_carry_step_count_across_reset(true);
        let mut env = CityFlowEnv::new(engine, cfg).unwrap();
        env.state.current_step = u32::MAX - 1;

        let s = env.step(0).unwrap();
        assert_eq!(env.current_step(), u32::MAX);
        assert!(!s.terminated);
        env.step(0).unwrap();
        env.reset(None).unwrap();
        env.step(0).unwrap();
        assert_eq!(env.current_step(), u32::MAX);
        assert_eq!(env.phase(), EpisodePhase::Active);
    }

    #[test]
    fn connect_threads_scenario_and_threads_to_engine() {
        let cfg = CityFlowConfig::default().with_scenario_path("/tmp/1x1/config.json").with_thread_count(3);
        let connector = |path: &std::path::Path, threads: usize| -> crate::engine::EngineResult<ScriptedEngine> {
            Ok(ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::default())).with_scenario(path, threads))
        };
        let env: CityFlowEnv<ScriptedEngine> = CityFlowEnv::connect(cfg, &connector).unwrap();
        assert_eq!(env.engine().scenario_path(), Some(std::path::Path::new("/tmp/1x1/config.json")));
        assert_eq!(env.engine().thread_count(), 3);

        let failing = |_: &std::path::Path, _: usize| -> crate::engine::EngineResult<ScriptedEngine> {
            Err("cannot open scenario".into())
        };
        let err = CityFlowEnv::<ScriptedEngine>::connect(CityFlowConfig::default(), &failing).err().unwrap();
        assert_eq!(err.to_string(), "cannot open scenario");
    }

    #[test]
    fn rejects_invalid_config() {
        let engine = ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::default()));
        let err = CityFlowEnv::new(engine, CityFlowConfig::default().with_thread_count(0)).err().unwrap();
        assert!(matches!(err, GymError::InvalidConfig(_)));
    }
}
