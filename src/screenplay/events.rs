//! Performance event bus
//!
//! A pure publish/subscribe relay decoupling the orchestration core from
//! reporting and diagnostics. Dispatch is isolated per subscriber: a slow,
//! failing, or panicking listener is logged and skipped, and never aborts
//! the performable or performance being reported on.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::performance::{IdentifierAndName, Outcome};

/// Lifecycle event published on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PerformanceEvent {
    /// The screenplay (whole test run) has started
    ScreenplayStarted,

    /// The screenplay has ended; process teardown follows
    ScreenplayEnded,

    /// A performance (one scenario) entered the InProgress state
    PerformanceBegun {
        /// Performance run identifier
        performance_id: Uuid,
        /// Naming hierarchy (e.g. fixture then test)
        naming: Vec<IdentifierAndName>,
    },

    /// A performance reached the Completed state
    PerformanceFinished {
        /// Performance run identifier
        performance_id: Uuid,
        /// Recorded outcome
        outcome: Outcome,
    },

    /// A cast created a new actor
    ActorCreated {
        /// Owning performance
        performance_id: Uuid,
        /// Actor display name
        actor: String,
    },

    /// An actor gained an ability
    GainedAbility {
        /// Owning performance
        performance_id: Uuid,
        /// Actor display name
        actor: String,
        /// Capability type attached
        ability: String,
    },

    /// An actor is about to execute a performable
    BeginPerformable {
        /// Owning performance
        performance_id: Uuid,
        /// Actor display name
        actor: String,
        /// Human-readable report for the performable
        report: String,
    },

    /// A performable produced a value
    PerformableResult {
        /// Owning performance
        performance_id: Uuid,
        /// Actor display name
        actor: String,
        /// Debug rendering of the produced value
        result: String,
    },

    /// An actor finished executing a performable. Always paired with the
    /// matching BeginPerformable, on success and on failure alike.
    EndPerformable {
        /// Owning performance
        performance_id: Uuid,
        /// Actor display name
        actor: String,
        /// Human-readable report for the performable
        report: String,
        /// Whether execution completed without error
        success: bool,
    },
}

/// Subscription handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

/// Observer notified of every event published on the bus
pub trait EventListener: Send + Sync {
    /// Handle one event. Returned errors are logged by the bus, not
    /// propagated to the publisher.
    fn handle(&self, event: &PerformanceEvent) -> anyhow::Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&PerformanceEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, event: &PerformanceEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Publish/subscribe relay for performance lifecycle events
pub struct EventBus {
    listeners: RwLock<Vec<(ListenerId, Arc<dyn EventListener>)>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Add a listener; it receives every event published after this call
    pub fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.write().retain(|(lid, _)| *lid != id);
    }

    /// Number of active subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Publish an event to every listener
    ///
    /// The listener list is snapshotted before dispatch so listeners may
    /// subscribe or unsubscribe reentrantly. Failures are isolated: each
    /// listener is notified regardless of what earlier listeners did.
    pub fn publish(&self, event: PerformanceEvent) {
        let snapshot: Vec<_> = self.listeners.read().clone();
        for (id, listener) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.handle(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(listener = ?id, error = %err, "event listener failed");
                }
                Err(_) => {
                    tracing::warn!(listener = ?id, "event listener panicked");
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
