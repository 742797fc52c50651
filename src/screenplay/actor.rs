//! Actors: named participants that hold abilities and execute performables
//!
//! An actor couples an identity (display name, unique within its cast), a
//! type-keyed ability store, and a performable executor that relays
//! begin/result/end events onto the performance event bus.

use std::any::{Any, type_name};
use std::sync::Arc;

use uuid::Uuid;

use super::ability::AbilityStore;
use super::error::{AbilityError, AbilityResult, Result};
use super::events::{EventBus, PerformanceEvent};
use super::performable::{Performable, Question, render_report};
use tokio_util::sync::CancellationToken;

/// A named participant in a performance
pub struct Actor {
    name: String,
    performance_id: Uuid,
    abilities: AbilityStore,
    events: Arc<EventBus>,
}

impl Actor {
    /// Create an actor belonging to the given performance
    pub fn new(name: impl Into<String>, performance_id: Uuid, events: Arc<EventBus>) -> Self {
        Self {
            name: name.into(),
            performance_id,
            abilities: AbilityStore::new(),
            events,
        }
    }

    /// The actor's display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the performance this actor belongs to
    pub fn performance_id(&self) -> Uuid {
        self.performance_id
    }

    /// Grant an ability, replacing any prior ability of the same capability
    /// type. Emits a GainedAbility event.
    pub fn is_able_to<T: Any + Send + Sync>(&self, ability: T) {
        let ability_type = self.abilities.attach(ability);
        self.events.publish(PerformanceEvent::GainedAbility {
            performance_id: self.performance_id,
            actor: self.name.clone(),
            ability: ability_type.to_string(),
        });
    }

    /// Check whether the actor holds an ability of type `T`
    pub fn has_ability<T: Any + Send + Sync>(&self) -> bool {
        self.abilities.has::<T>()
    }

    /// Look up the ability of type `T`
    ///
    /// Fails with [`AbilityError::Missing`] when the actor lacks the
    /// capability; the message carries the actor name and requested type.
    pub fn ability<T: Any + Send + Sync>(&self) -> AbilityResult<Arc<T>> {
        self.abilities.get::<T>().ok_or_else(|| AbilityError::Missing {
            actor: self.name.clone(),
            ability_type: type_name::<T>(),
        })
    }

    /// Execute a performable as this actor
    ///
    /// Emits BeginPerformable before execution and EndPerformable after it,
    /// on success and failure alike, so observers always see matching pairs.
    pub async fn perform<P: Performable>(
        &self,
        performable: &P,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let report = render_report(type_name::<P>(), || performable.report(self));
        self.begin_performable(&report);

        let result = performable.perform_as(self, cancel).await;

        self.end_performable(&report, result.is_ok());
        result
    }

    /// Execute a question as this actor and return its answer
    ///
    /// On success a PerformableResult event carrying the answer's rendering
    /// is emitted before EndPerformable.
    pub async fn perform_and_get<Q: Question>(
        &self,
        question: &Q,
        cancel: &CancellationToken,
    ) -> Result<Q::Answer> {
        let report = render_report(type_name::<Q>(), || question.report(self));
        self.begin_performable(&report);

        let result = question.answer_as(self, cancel).await;

        if let Ok(answer) = &result {
            self.events.publish(PerformanceEvent::PerformableResult {
                performance_id: self.performance_id,
                actor: self.name.clone(),
                result: format!("{answer:?}"),
            });
        }
        self.end_performable(&report, result.is_ok());
        result
    }

    fn begin_performable(&self, report: &str) {
        self.events.publish(PerformanceEvent::BeginPerformable {
            performance_id: self.performance_id,
            actor: self.name.clone(),
            report: report.to_string(),
        });
    }

    fn end_performable(&self, report: &str, success: bool) {
        self.events.publish(PerformanceEvent::EndPerformable {
            performance_id: self.performance_id,
            actor: self.name.clone(),
            report: report.to_string(),
            success,
        });
    }
}
