//! Performances: one scenario's execution context
//!
//! A performance couples an opaque run identifier, a naming hierarchy
//! (fixture → test), a strict lifecycle state machine, an owned service
//! resolution scope, a cast/stage pair, and a cancellation token signalled
//! when the scenario's deadline elapses.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::cast::Cast;
use super::error::{PerformanceError, PerformanceResult};
use super::events::{EventBus, PerformanceEvent};
use super::resolver::{ServiceRegistry, ServiceResolver};
use super::stage::Stage;

/// One level of a performance's naming hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierAndName {
    /// Stable identifier (e.g. a fully qualified test id)
    pub identifier: String,
    /// Optional human-readable display name
    pub display_name: Option<String>,
}

impl IdentifierAndName {
    /// Create a naming entry
    pub fn new(identifier: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name,
        }
    }
}

/// Tri-state outcome recorded when a performance completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The scenario passed
    Success,
    /// The scenario failed
    Failure,
    /// The scenario produced no verdict (e.g. the deadline won the race)
    Undetermined,
}

impl Outcome {
    /// Map the adapter-facing tri-state flag to an outcome
    pub fn from_flag(success: Option<bool>) -> Self {
        match success {
            Some(true) => Outcome::Success,
            Some(false) => Outcome::Failure,
            None => Outcome::Undetermined,
        }
    }
}

/// Lifecycle state of a performance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceState {
    /// Created but not yet begun
    NotStarted,
    /// Begun and currently executing
    InProgress,
    /// Terminal; carries the recorded outcome
    Completed(Outcome),
}

impl fmt::Display for PerformanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceState::NotStarted => "not started",
            PerformanceState::InProgress => "in progress",
            PerformanceState::Completed(_) => "completed",
        };
        f.write_str(label)
    }
}

/// One scenario's execution context and resolution scope
pub struct Performance {
    id: Uuid,
    naming: Vec<IdentifierAndName>,
    state: Mutex<PerformanceState>,
    resolver: ServiceResolver,
    events: Arc<EventBus>,
    cast: Arc<Cast>,
    stage: Arc<Stage>,
    cancel: CancellationToken,
}

impl Performance {
    /// Create a performance with its own resolution scope, cast, and stage
    pub fn new(
        naming: Vec<IdentifierAndName>,
        registry: Arc<ServiceRegistry>,
        events: Arc<EventBus>,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        let cast = Arc::new(Cast::new(id, events.clone()));
        let stage = Arc::new(Stage::new(cast.clone()));

        Arc::new(Self {
            id,
            naming,
            state: Mutex::new(PerformanceState::NotStarted),
            resolver: ServiceResolver::new(registry),
            events,
            cast,
            stage,
            cancel: CancellationToken::new(),
        })
    }

    /// Opaque run identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Naming hierarchy, outermost level first
    pub fn naming(&self) -> &[IdentifierAndName] {
        &self.naming
    }

    /// Current lifecycle state
    pub fn state(&self) -> PerformanceState {
        *self.state.lock()
    }

    /// Recorded outcome, once completed
    pub fn outcome(&self) -> Option<Outcome> {
        match *self.state.lock() {
            PerformanceState::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Scoped service accessor for this performance
    pub fn services(&self) -> &ServiceResolver {
        &self.resolver
    }

    /// Event bus shared with the owning screenplay
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// This performance's actor registry
    pub fn cast(&self) -> &Arc<Cast> {
        &self.cast
    }

    /// This performance's spotlight
    pub fn stage(&self) -> &Arc<Stage> {
        &self.stage
    }

    /// Token cancelled when the performance's deadline elapses
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Transition NotStarted → InProgress
    ///
    /// Fails with InvalidTransition from any other state. Emits
    /// PerformanceBegun.
    pub fn begin(&self) -> PerformanceResult<()> {
        {
            let mut state = self.state.lock();
            match *state {
                PerformanceState::NotStarted => *state = PerformanceState::InProgress,
                from => {
                    return Err(PerformanceError::InvalidTransition {
                        from,
                        attempted: "begin",
                    });
                }
            }
        }

        tracing::debug!(performance = %self.id, "performance begun");
        self.events.publish(PerformanceEvent::PerformanceBegun {
            performance_id: self.id,
            naming: self.naming.clone(),
        });
        Ok(())
    }

    /// Transition InProgress → Completed, recording the tri-state outcome
    ///
    /// Fails with InvalidTransition before `begin` or after a prior
    /// completion. Emits PerformanceFinished.
    pub fn complete(&self, success: Option<bool>) -> PerformanceResult<()> {
        let outcome = Outcome::from_flag(success);
        {
            let mut state = self.state.lock();
            match *state {
                PerformanceState::InProgress => *state = PerformanceState::Completed(outcome),
                from => {
                    return Err(PerformanceError::InvalidTransition {
                        from,
                        attempted: "complete",
                    });
                }
            }
        }

        tracing::debug!(performance = %self.id, ?outcome, "performance finished");
        self.events.publish(PerformanceEvent::PerformanceFinished {
            performance_id: self.id,
            outcome,
        });
        Ok(())
    }

    /// Dispose every per-scenario service built during this performance
    pub fn release_services(&self) {
        self.resolver.release_per_scenario_services();
    }
}
