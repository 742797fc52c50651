//! Stage: the single-slot spotlight
//!
//! The stage holds at most one "spotlit" actor, enabling passive-voice test
//! phrasing ("the actor in the spotlight..."). The slot is freely
//! replaceable; last write wins.

use std::sync::Arc;

use parking_lot::RwLock;

use super::actor::Actor;
use super::cast::{Cast, Persona};
use super::error::Result;

/// Single mutable reference to the current actor
pub struct Stage {
    cast: Arc<Cast>,
    spotlight: RwLock<Option<Arc<Actor>>>,
}

impl Stage {
    /// Create a stage backed by the given cast
    pub fn new(cast: Arc<Cast>) -> Self {
        Self {
            cast,
            spotlight: RwLock::new(None),
        }
    }

    /// The cast this stage resolves personas through
    pub fn cast(&self) -> &Arc<Cast> {
        &self.cast
    }

    /// Put an actor in the spotlight, replacing any previous occupant
    pub fn spotlight(&self, actor: Arc<Actor>) {
        *self.spotlight.write() = Some(actor);
    }

    /// Resolve a persona's actor through the cast and spotlight it
    pub fn spotlight_persona(&self, persona: &dyn Persona) -> Result<Arc<Actor>> {
        let actor = self.cast.actor_for(persona)?;
        self.spotlight(actor.clone());
        Ok(actor)
    }

    /// The currently spotlit actor, or `None` when the spotlight is off
    pub fn spotlit_actor(&self) -> Option<Arc<Actor>> {
        self.spotlight.read().clone()
    }

    /// Clear the spotlight. A no-op when it is already off.
    pub fn turn_spotlight_off(&self) {
        *self.spotlight.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screenplay::events::EventBus;
    use uuid::Uuid;

    fn test_stage() -> Stage {
        let cast = Arc::new(Cast::new(Uuid::new_v4(), Arc::new(EventBus::new())));
        Stage::new(cast)
    }

    #[test]
    fn test_spotlight_last_write_wins() {
        let stage = test_stage();
        let joe = stage.cast().actor("Joe");
        let pam = stage.cast().actor("Pam");

        stage.spotlight(joe);
        stage.spotlight(pam.clone());

        let spotlit = stage.spotlit_actor().unwrap();
        assert!(Arc::ptr_eq(&spotlit, &pam));
    }

    #[test]
    fn test_spotlight_off_is_idempotent() {
        let stage = test_stage();
        assert!(stage.spotlit_actor().is_none());

        stage.turn_spotlight_off();
        stage.spotlight(stage.cast().actor("Joe"));
        stage.turn_spotlight_off();
        stage.turn_spotlight_off();

        assert!(stage.spotlit_actor().is_none());
    }
}
