//! Built-in stopwatch ability and its performables
//!
//! A small, dependency-free capability useful for timing assertions in
//! scenarios, and a reference example of the ability/performable shape.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::actor::Actor;
use super::error::Result;
use super::performable::{Performable, Question};

#[derive(Default)]
struct StopwatchState {
    started_at: Option<Instant>,
    accumulated: Duration,
}

/// Ability to measure elapsed wall-clock time
pub struct UseAStopwatch {
    state: Mutex<StopwatchState>,
}

impl UseAStopwatch {
    /// Create a stopped, zeroed stopwatch
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StopwatchState::default()),
        }
    }

    /// Start (or resume) measuring. A no-op when already running.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
    }

    /// Stop measuring, banking the elapsed time. A no-op when stopped.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let Some(started_at) = state.started_at.take() {
            state.accumulated += started_at.elapsed();
        }
    }

    /// Zero the banked time. A running stopwatch keeps running from now.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.accumulated = Duration::ZERO;
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
    }

    /// Elapsed time: banked time plus the current running segment
    pub fn elapsed(&self) -> Duration {
        let state = self.state.lock();
        let running = state
            .started_at
            .map(|started_at| started_at.elapsed())
            .unwrap_or_default();
        state.accumulated + running
    }
}

impl Default for UseAStopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Task: start the actor's stopwatch
pub struct StartTheStopwatch;

#[async_trait]
impl Performable for StartTheStopwatch {
    fn report(&self, actor: &Actor) -> String {
        format!("{} starts the stopwatch", actor.name())
    }

    async fn perform_as(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        actor.ability::<UseAStopwatch>()?.start();
        Ok(())
    }
}

/// Task: stop the actor's stopwatch
pub struct StopTheStopwatch;

#[async_trait]
impl Performable for StopTheStopwatch {
    fn report(&self, actor: &Actor) -> String {
        format!("{} stops the stopwatch", actor.name())
    }

    async fn perform_as(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        actor.ability::<UseAStopwatch>()?.stop();
        Ok(())
    }
}

/// Task: reset the actor's stopwatch to zero
pub struct ResetTheStopwatch;

#[async_trait]
impl Performable for ResetTheStopwatch {
    fn report(&self, actor: &Actor) -> String {
        format!("{} resets the stopwatch", actor.name())
    }

    async fn perform_as(&self, actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        actor.ability::<UseAStopwatch>()?.reset();
        Ok(())
    }
}

/// Question: read the elapsed time from the actor's stopwatch
pub struct ReadTheStopwatch;

#[async_trait]
impl Question for ReadTheStopwatch {
    type Answer = Duration;

    fn report(&self, actor: &Actor) -> String {
        format!("{} reads the stopwatch", actor.name())
    }

    async fn answer_as(
        &self,
        actor: &Actor,
        _cancel: &CancellationToken,
    ) -> Result<Self::Answer> {
        Ok(actor.ability::<UseAStopwatch>()?.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_watch_reads_identically() {
        let watch = UseAStopwatch::new();
        watch.start();
        std::thread::sleep(Duration::from_millis(20));
        watch.stop();

        let first = watch.elapsed();
        let second = watch.elapsed();
        assert_eq!(first, second);
        assert!(first >= Duration::from_millis(15));
    }

    #[test]
    fn test_reset_while_stopped_is_zero() {
        let watch = UseAStopwatch::new();
        watch.start();
        std::thread::sleep(Duration::from_millis(5));
        watch.stop();
        watch.reset();
        assert_eq!(watch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let watch = UseAStopwatch::new();
        watch.stop();
        assert_eq!(watch.elapsed(), Duration::ZERO);
    }
}
