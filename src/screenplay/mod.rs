//! Screenplay orchestration engine and public API
//!
//! This module provides the `Screenplay` façade that wires the event bus and
//! service registry, creates performances, and drives scenario execution
//! under a deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// Submodules
pub mod ability;
pub mod actor;
pub mod cast;
pub mod error;
pub mod events;
pub mod performable;
pub mod performance;
pub mod resolver;
pub mod scope;
pub mod stage;
pub mod stopwatch;

use error::{PerformanceError, Result, ScreenplayError};
use events::{EventBus, PerformanceEvent};
use performance::{IdentifierAndName, Performance};
use resolver::{Service, ServiceRegistry, ServiceResolver};
use tokio::task::JoinError;

/// Process-wide entry point for executing scenarios as performances
///
/// A screenplay is constructed explicitly and passed down to adapters; there
/// is no ambient global instance, which keeps parallel test runs decoupled.
pub struct Screenplay {
    registry: Arc<ServiceRegistry>,
    events: Arc<EventBus>,
}

impl Screenplay {
    /// Start building a screenplay
    pub fn builder() -> ScreenplayBuilder {
        ScreenplayBuilder {
            registry: ServiceRegistry::new(),
        }
    }

    /// The shared event bus; subscribe reporting collaborators here
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// The frozen service registry backing every performance scope
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Announce the start of the test run
    pub fn start(&self) {
        self.events.publish(PerformanceEvent::ScreenplayStarted);
    }

    /// Announce the end of the test run and dispose every lazy singleton
    /// that was built. Externally owned singletons are untouched.
    pub fn finish(&self) {
        self.events.publish(PerformanceEvent::ScreenplayEnded);
        self.registry.release_lazy_singletons();
    }

    /// Create a performance with its own resolution scope, cast, and stage
    pub fn create_performance(&self, naming: Vec<IdentifierAndName>) -> Arc<Performance> {
        Performance::new(naming, self.registry.clone(), self.events.clone())
    }

    /// Execute one scenario as a performance
    ///
    /// Drives Begin → logic → Complete. The deadline, when given, is
    /// enforced here: the logic runs as a spawned task racing a timer, so a
    /// body that ignores its cancellation token cannot hold up the verdict.
    /// When the deadline wins, the performance's token is cancelled, a
    /// [`PerformanceError::TimedOut`] is returned, and the outcome is
    /// recorded as undetermined; the task itself may keep running in the
    /// background until it observes the token.
    ///
    /// Completion happens exactly once and per-scenario services are always
    /// released, whatever the logic did.
    pub async fn execute_as_performance<F, Fut>(
        &self,
        naming: Vec<IdentifierAndName>,
        timeout: Option<Duration>,
        logic: F,
    ) -> Result<Option<bool>>
    where
        F: FnOnce(Arc<Performance>) -> Fut,
        Fut: Future<Output = anyhow::Result<Option<bool>>> + Send + 'static,
    {
        let performance = self.create_performance(naming);
        performance.begin()?;

        let task = tokio::spawn(logic(performance.clone()));
        let verdict: Result<Option<bool>> = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => flatten_join(joined),
                Err(_) => {
                    performance.cancellation_token().cancel();
                    Err(PerformanceError::TimedOut { timeout: limit }.into())
                }
            },
            None => flatten_join(task.await),
        };

        let flag = match &verdict {
            Ok(flag) => *flag,
            Err(ScreenplayError::Performance(PerformanceError::TimedOut { .. })) => None,
            Err(_) => Some(false),
        };
        if let Err(err) = performance.complete(flag) {
            // Scenario logic drove the state machine itself; the recorded
            // outcome stands.
            tracing::debug!(performance = %performance.id(), error = %err, "completion already recorded");
        }
        performance.release_services();

        verdict
    }
}

fn flatten_join(
    joined: std::result::Result<anyhow::Result<Option<bool>>, JoinError>,
) -> Result<Option<bool>> {
    match joined {
        Ok(Ok(flag)) => Ok(flag),
        Ok(Err(err)) => Err(ScreenplayError::Scenario(err)),
        Err(join_err) => Err(ScreenplayError::Scenario(anyhow::anyhow!(
            "scenario task panicked: {join_err}"
        ))),
    }
}

/// Builder assembling a screenplay's service registrations
pub struct ScreenplayBuilder {
    registry: ServiceRegistry,
}

impl ScreenplayBuilder {
    /// Register an externally owned singleton instance
    pub fn with_singleton<T: Service>(mut self, instance: Arc<T>) -> Self {
        self.registry.register_instance(instance);
        self
    }

    /// Register a lazy singleton factory
    pub fn with_lazy_singleton<T, F>(mut self, factory: F) -> Self
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.registry.register_lazy_singleton(factory);
        self
    }

    /// Register a per-scenario factory
    pub fn with_per_scenario<T, F>(mut self, factory: F) -> Self
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.registry.register_per_scenario(factory);
        self
    }

    /// Apply arbitrary registrations (keyed variants and the like)
    pub fn configure_services<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut ServiceRegistry),
    {
        configure(&mut self.registry);
        self
    }

    /// Freeze the registrations and build the screenplay
    pub fn build(self) -> Screenplay {
        Screenplay {
            registry: Arc::new(self.registry),
            events: Arc::new(EventBus::new()),
        }
    }
}

// Re-export commonly used types
pub use actor::Actor;
pub use cast::{Cast, Persona};
pub use error::{AbilityError, ResolverError, ScreenplayError as Error};
pub use events::{EventListener, ListenerId};
pub use performable::{Performable, Question};
pub use performance::{Outcome, PerformanceState};
pub use resolver::ServiceLifetime;
pub use scope::{ScopeLevel, ScopedServices};
pub use stage::Stage;
