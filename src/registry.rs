// Environment registration by id.
/// Minimal registry to construct environments by id with an associated EnvSpec.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::config::{CityFlowConfig, DEFAULT_STEPS_PER_EPISODE};
use crate::core::{Env, GymError, Info, RenderFrame, Result, Step};
use crate::engine::{EngineConnector, TrafficEngine};
use crate::envs::CityFlowEnv;

/// Id of the single-intersection low-traffic scenario.
pub const CITYFLOW_1X1_ID: &str = "CityFlow-1x1-LowTraffic-v0";

/// Key-value kwargs for make(). Values are parsed by the factory.
pub type KwArgs = HashMap<String, String>;

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvSpec {
    /// Unique identifier like "CityFlow-1x1-LowTraffic-v0".
    pub id: String,
    /// Episode length the environment terminates at, if any.
    pub max_episode_steps: Option<u32>,
    /// Target return for a "solved" score, if defined.
    pub reward_threshold: Option<f32>,
    /// Whether the environment has nondeterminism beyond RNG seeds.
    pub nondeterministic: bool,
    pub version: Option<String>,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            max_episode_steps: None,
            reward_threshold: None,
            nondeterministic: false,
            version: None,
        }
    }
}

/// Spec for [`CITYFLOW_1X1_ID`].
pub fn cityflow_spec() -> EnvSpec {
    EnvSpec {
        max_episode_steps: Some(DEFAULT_STEPS_PER_EPISODE),
        version: Some("0".into()),
        ..EnvSpec::new(CITYFLOW_1X1_ID)
    }
}

/// Type-erased environment so make() can return `Box<dyn EnvDyn>`.
pub trait EnvDyn {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Box<dyn Any>, Info)>;
    fn step(&mut self, action: Box<dyn Any>) -> Result<Step<Box<dyn Any>>>;
    fn render(&self) -> Result<Option<RenderFrame>>;
    fn close(&mut self);
}

/// Adapts any Env into EnvDyn by boxing Obs/Act via Any.
struct DynEnv<E: Env>(E);

impl<E: Env> EnvDyn for DynEnv<E>
where
    E::Obs: Any + 'static,
    E::Act: Any + 'static,
{
    fn reset(&mut self, seed: Option<u64>) -> Result<(Box<dyn Any>, Info)> {
        let (obs, info) = self.0.reset(seed)?;
        Ok((Box::new(obs), info))
    }

    fn step(&mut self, action: Box<dyn Any>) -> Result<Step<Box<dyn Any>>> {
        let action = action.downcast::<E::Act>().map_err(|_| GymError::InvalidArgument {
            value: "action of another type".into(),
            type_name: std::any::type_name::<E::Act>(),
        })?;
        let s = self.0.step(*action)?;
        Ok(Step::new(Box::new(s.observation) as Box<dyn Any>, s.reward, s.terminated, s.truncated, s.info))
    }

    fn render(&self) -> Result<Option<RenderFrame>> { self.0.render() }
    fn close(&mut self) { self.0.close() }
}

/// Factory closure constructing an environment from kwargs.
pub type FactoryFn = Box<dyn Fn(KwArgs) -> Result<Box<dyn EnvDyn + Send + Sync>> + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    factories: HashMap<String, FactoryFn>,
}

struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    fn new() -> Self { Self { inner: RwLock::new(RegistryInner::default()) } }

    fn register(&self, spec: EnvSpec, factory: FactoryFn) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| GymError::Other("registry poisoned".into()))?;
        if g.specs.contains_key(&spec.id) {
            return Err(GymError::Other(format!("Env id already registered: {}", spec.id)));
        }
        g.factories.insert(spec.id.clone(), factory);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    fn make(&self, id: &str, kwargs: KwArgs) -> Result<Box<dyn EnvDyn + Send + Sync>> {
        let guard = self.inner.read().map_err(|_| GymError::Other("registry poisoned".into()))?;
        match guard.factories.get(id) {
            Some(f) => f(kwargs),
            None => Err(GymError::Other(format!("Unknown environment id: {id}"))),
        }
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Register an environment spec and its factory globally.
pub fn register(spec: EnvSpec, factory: FactoryFn) -> Result<()> { registry().register(spec, factory) }

/// Fetch a registered EnvSpec by id.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// Construct an environment by id with kwargs, returning a boxed dynamic env.
pub fn make<S: AsRef<str>>(id: S, kwargs: KwArgs) -> Result<Box<dyn EnvDyn + Send + Sync>> { registry().make(id.as_ref(), kwargs) }

/// Adapt a fallible constructor of a concrete Env into a factory function.
pub fn factory_of<E, F>(ctor: F) -> FactoryFn
where
    E: Env + Send + Sync + 'static,
    E::Obs: Any + 'static,
    E::Act: Any + 'static,
    F: Fn(KwArgs) -> Result<E> + Send + Sync + 'static,
{
    Box::new(move |kwargs: KwArgs| {
        let env = ctor(kwargs)?;
        Ok(Box::new(DynEnv::<E>(env)) as Box<dyn EnvDyn + Send + Sync>)
    })
}

/// Factory building a [`CityFlowEnv`] from kwargs (see [`CityFlowConfig::from_kwargs`])
/// and an engine connector.
pub fn cityflow_factory<E, C>(connector: C) -> FactoryFn
where
    E: TrafficEngine + Send + Sync + 'static,
    C: EngineConnector<E> + Send + Sync + 'static,
{
    factory_of::<CityFlowEnv<E>, _>(move |kwargs| {
        let config = CityFlowConfig::from_kwargs(&kwargs)?;
        CityFlowEnv::connect(config, &connector)
    })
}

/// Register [`CITYFLOW_1X1_ID`] with the given engine connector.
pub fn register_cityflow<E, C>(connector: C) -> Result<()>
where
    E: TrafficEngine + Send + Sync + 'static,
    C: EngineConnector<E> + Send + Sync + 'static,
{
    register(cityflow_spec(), cityflow_factory::<E, C>(connector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CountProfile, EngineResult, LaneSample, ScriptedEngine};
    use crate::envs::Observation;
    use std::path::Path;

    fn connector(path: &Path, threads: usize) -> EngineResult<ScriptedEngine> {
        Ok(ScriptedEngine::single_intersection(CountProfile::Constant(LaneSample::new(2, 1))).with_scenario(path, threads))
    }

    #[test]
    fn register_and_make_cityflow() {
        let spec = EnvSpec { id: "CityFlow-registry-test-v0".into(), ..cityflow_spec() };
        register(spec.clone(), cityflow_factory::<ScriptedEngine, _>(connector)).expect("register ok");
        assert_eq!(get_spec(&spec.id), Some(spec.clone()));
        assert!(register(spec.clone(), cityflow_factory::<ScriptedEngine, _>(connector)).is_err());

        let kwargs: KwArgs = [("steps_per_episode".to_string(), "3".to_string())].into_iter().collect();
        let mut env = make(&spec.id, kwargs).expect("make ok");
        let (obs, _info) = env.reset(None).unwrap();
        assert!(obs.downcast_ref::<Observation>().is_some());

        let s = env.step(Box::new(1i64)).unwrap();
        assert_eq!(s.reward, -8.0);
        assert!(!s.terminated);
        assert!(env.step(Box::new(2i64)).unwrap().terminated);

        let err = env.step(Box::new(1u8)).err().unwrap();
        assert!(matches!(err, GymError::InvalidArgument { type_name: "i64", .. }));
        assert!(matches!(env.render().unwrap(), Some(RenderFrame::Text(_))));
    }

    #[test]
    fn make_reports_unknown_id_and_bad_kwargs() {
        assert!(make("CityFlow-missing-v0", KwArgs::new()).is_err());

        let spec = EnvSpec { id: "CityFlow-kwargs-test-v0".into(), ..cityflow_spec() };
        register(spec.clone(), cityflow_factory::<ScriptedEngine, _>(connector)).unwrap();
        let kwargs: KwArgs = [("thread_count".to_string(), "zero".to_string())].into_iter().collect();
        assert!(matches!(make(&spec.id, kwargs).err(), Some(GymError::InvalidConfig(_))));
    }

    #[test]
    fn cityflow_spec_matches_default_episode_length() {
        let spec = cityflow_spec();
        assert_eq!(spec.id, CITYFLOW_1X1_ID);
        assert_eq!(spec.max_episode_steps, Some(1500));
    }
}
