//! Type-keyed ability storage
//!
//! Each actor owns an [`AbilityStore`]: a capability bag holding at most one
//! ability instance per capability type. Abilities are opaque to the core;
//! any `Send + Sync` type qualifies.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

struct AbilityEntry {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Per-actor capability bag keyed by capability type
pub struct AbilityStore {
    abilities: RwLock<HashMap<TypeId, AbilityEntry>>,
}

impl AbilityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            abilities: RwLock::new(HashMap::new()),
        }
    }

    /// Attach an ability, replacing any prior ability of the same type.
    /// Returns the capability type name for event emission.
    pub fn attach<T: Any + Send + Sync>(&self, ability: T) -> &'static str {
        let name = type_name::<T>();
        self.abilities.write().insert(
            TypeId::of::<T>(),
            AbilityEntry {
                type_name: name,
                value: Arc::new(ability),
            },
        );
        name
    }

    /// Check whether an ability of type `T` is held
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.abilities.read().contains_key(&TypeId::of::<T>())
    }

    /// Look up the ability of type `T`, if held
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let abilities = self.abilities.read();
        let entry = abilities.get(&TypeId::of::<T>())?;
        entry.value.clone().downcast::<T>().ok()
    }

    /// Capability type names currently held, for diagnostics
    pub fn ability_names(&self) -> Vec<&'static str> {
        self.abilities
            .read()
            .values()
            .map(|entry| entry.type_name)
            .collect()
    }
}

impl Default for AbilityStore {
    fn default() -> Self {
        Self::new()
    }
}
