// Wrappers for Env composition.
//
// - TimeLimit: truncate episodes after a fixed number of steps
// - TransformReward: map rewards through a function (e.g. scaling)
// - RecordEpisodeStatistics: report return and length when an episode ends

use crate::core::{Env, Info, InfoValue, RenderFrame, Result, Step};

/// Marks `truncated` once `max_steps` steps have run since the last reset.
pub struct TimeLimit<E: Env> {
    inner: E,
    max_steps: u32,
    steps: u32,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(inner: E, max_steps: u32) -> Self {
        Self { inner, max_steps, steps: 0 }
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for TimeLimit<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.steps = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.steps += 1;
        if !s.terminated && self.steps >= self.max_steps {
            s.truncated = true;
        }
        Ok(s)
    }

    fn render(&self) -> Result<Option<RenderFrame>> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}

/// Maps rewards through a user-provided function.
pub struct TransformReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    inner: E,
    f: F,
}

impl<E, F> TransformReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    pub fn new(inner: E, f: F) -> Self { Self { inner, f } }

    pub fn inner(&self) -> &E { &self.inner }
}

impl<E, F> Env for TransformReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> { self.inner.reset(seed) }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        s.reward = (self.f)(s.reward);
        Ok(s)
    }

    fn render(&self) -> Result<Option<RenderFrame>> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}

/// Tracks cumulative return and episode length.
/// When an episode ends (terminated or truncated) the step's Info gets:
/// - "episode_return": f64
/// - "episode_length": i64
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
    ep_return: f64,
    ep_length: i64,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner, ep_return: 0.0, ep_length: 0 } }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Info)> {
        self.ep_return = 0.0;
        self.ep_length = 0;
        self.inner.reset(seed)
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.ep_return += s.reward as f64;
        self.ep_length += 1;
        if s.done() {
            s.info.insert("episode_return", InfoValue::from(self.ep_return));
            s.info.insert("episode_length", InfoValue::from(self.ep_length));
            self.ep_return = 0.0;
            self.ep_length = 0;
        }
        Ok(s)
    }

    fn render(&self) -> Result<Option<RenderFrame>> { self.inner.render() }
    fn close(&mut self) { self.inner.close() }
}
