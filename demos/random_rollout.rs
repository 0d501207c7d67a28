use std::path::Path;

use rust_gym_cityflow::engine::{CountProfile, EngineResult};
use rust_gym_cityflow::utils::SeedSequence;
use rust_gym_cityflow::{
    CityFlowConfig, CityFlowEnv, Env, InfoValue, RecordEpisodeStatistics, ScriptedEngine, Space,
};

fn connect(scenario: &Path, threads: usize) -> EngineResult<ScriptedEngine> {
    Ok(ScriptedEngine::single_intersection(CountProfile::Uniform { seed: 2024, max_vehicles: 12 })
        .with_scenario(scenario, threads))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut seeds = SeedSequence::new(7);
    let mut rng = seeds.next_rng();

    let config = CityFlowConfig::default().with_steps_per_episode(300);
    let env: CityFlowEnv<ScriptedEngine> = CityFlowEnv::connect(config, &connect)?;
    let actions = env.action_space().clone();
    let mut env = RecordEpisodeStatistics::new(env);

    env.reset(None)?;
    loop {
        let phase = actions.sample(&mut rng);
        let step = env.step(i64::from(phase))?;
        if env.inner().current_step() % 50 == 0 {
            env.render()?;
        }
        if step.done() {
            if let (Some(InfoValue::F64(ret)), Some(InfoValue::I64(len))) =
                (step.info.get("episode_return"), step.info.get("episode_length"))
            {
                tracing::info!(episode_return = *ret, episode_length = *len, "episode finished");
            }
            break;
        }
    }
    env.close();
    Ok(())
}
