// Core traits and types shared by every environment in the crate.

use crate::engine::EngineError;

/// A small ordered key-value map returned alongside observations.
/// Insertion order is preserved so printed infos are stable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Value types stored in an [`Info`] map.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<u32> for InfoValue { fn from(v: u32) -> Self { InfoValue::I64(v as i64) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<f32> for InfoValue { fn from(v: f32) -> Self { InfoValue::F64(v as f64) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }

/// Render modes an environment may advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderMode {
    /// Print a human readable status line to stdout.
    Human,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Human => "human",
        }
    }
}

impl std::str::FromStr for RenderMode {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(RenderMode::Human),
            other => Err(GymError::NotSupported(format!("render mode {other:?}"))),
        }
    }
}

/// A frame returned by `Env::render`.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderFrame {
    /// Textual representation of a frame.
    Text(String),
}

/// A step result from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs> {
    pub observation: Obs,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f32, terminated: bool, truncated: bool, info: Info) -> Self {
        Self { observation, reward, terminated, truncated, info }
    }

    /// Classic gym `done` flag: the episode ended for either reason.
    pub fn done(&self) -> bool { self.terminated || self.truncated }
}

/// Recoverable errors across the environment APIs.
#[derive(thiserror::Error, Debug)]
pub enum GymError {
    /// An action outside the declared action space (or of the wrong type).
    #[error("{value} ({type_name}) invalid")]
    InvalidArgument { value: String, type_name: &'static str },
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    /// A fault raised by the traffic engine, passed through untouched.
    #[error(transparent)]
    Engine(EngineError),
    #[error("Other error: {0}")]
    Other(String),
}

impl GymError {
    /// Build an `InvalidArgument` error carrying the offending value and its type.
    pub fn invalid_argument<T: std::fmt::Debug>(value: &T) -> Self {
        GymError::InvalidArgument {
            value: format!("{value:?}"),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl From<EngineError> for GymError {
    fn from(e: EngineError) -> Self { GymError::Engine(e) }
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// Core environment trait following the Gymnasium contract.
///
/// Every call may reach into an external simulator, so all of them are fallible.
pub trait Env {
    type Obs;
    type Act;

    /// Reset the environment to an initial state.
    /// Implementations should re-seed internal RNGs when `seed` is provided.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)>;

    /// Apply an action and advance the environment by one step.
    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>>;

    /// Render a frame of the current state, if supported.
    fn render(&self) -> Result<Option<RenderFrame>> { Ok(None) }

    /// Close and release any external resources.
    fn close(&mut self) {}
}
