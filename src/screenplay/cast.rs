//! Cast: actor registry and factory
//!
//! A cast produces at most one actor per name within its performance. The
//! first request for a name creates the actor and announces it on the event
//! bus exactly once; later requests return the cached instance. Personas are
//! named actor templates whose ability-granting factory runs at most once
//! per cast, memoized by persona name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::actor::Actor;
use super::error::Result;
use super::events::{EventBus, PerformanceEvent};

/// A named actor template
///
/// The persona controls the actor's name and grants its initial abilities.
pub trait Persona: Send + Sync {
    /// Name of the actor this persona produces
    fn name(&self) -> &str;

    /// Grant the freshly created actor its abilities. Invoked exactly once
    /// per cast, on first request.
    fn grant_abilities(&self, actor: &Actor) -> Result<()>;
}

/// Registry producing one actor per name within a performance
pub struct Cast {
    performance_id: Uuid,
    events: Arc<EventBus>,
    actors: Mutex<HashMap<String, Arc<Actor>>>,
}

impl Cast {
    /// Create an empty cast for the given performance
    pub fn new(performance_id: Uuid, events: Arc<EventBus>) -> Self {
        Self {
            performance_id,
            events,
            actors: Mutex::new(HashMap::new()),
        }
    }

    /// Get the actor for `name`, creating it on first request
    ///
    /// Creation announces the actor on the event bus exactly once; repeated
    /// lookups return the same instance without re-announcing.
    pub fn actor(&self, name: &str) -> Arc<Actor> {
        let mut actors = self.actors.lock();
        if let Some(actor) = actors.get(name) {
            return actor.clone();
        }

        let actor = Arc::new(Actor::new(name, self.performance_id, self.events.clone()));
        actors.insert(name.to_string(), actor.clone());
        self.events.publish(PerformanceEvent::ActorCreated {
            performance_id: self.performance_id,
            actor: name.to_string(),
        });
        actor
    }

    /// Get the actor for a persona, creating and equipping it on first
    /// request
    ///
    /// The persona's factory runs at most once per cast, even when the
    /// persona is requested many times; the creation lock serializes
    /// concurrent first requests.
    pub fn actor_for(&self, persona: &dyn Persona) -> Result<Arc<Actor>> {
        let mut actors = self.actors.lock();
        if let Some(actor) = actors.get(persona.name()) {
            return Ok(actor.clone());
        }

        let actor = Arc::new(Actor::new(
            persona.name(),
            self.performance_id,
            self.events.clone(),
        ));
        actors.insert(persona.name().to_string(), actor.clone());
        self.events.publish(PerformanceEvent::ActorCreated {
            performance_id: self.performance_id,
            actor: persona.name().to_string(),
        });
        persona.grant_abilities(&actor)?;
        Ok(actor)
    }

    /// Number of actors created so far
    pub fn actor_count(&self) -> usize {
        self.actors.lock().len()
    }
}
