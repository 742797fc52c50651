//! Scoped service resolution with lifetime-aware disposal
//!
//! Services are registered against a contract type (optionally discriminated
//! by a string key) with one of three lifetimes:
//! - **Singleton**: an eagerly supplied, externally owned instance. Never
//!   disposed by the resolver.
//! - **LazySingleton**: built on first resolution, at most once per process,
//!   shared by every performance thereafter. Disposed at process teardown.
//! - **PerScenario**: built at most once per performance scope, never shared
//!   across scopes. Disposed when the scope releases.
//!
//! First-time construction is guarded by per-registration once-cells, so
//! concurrent first resolutions serialize on the one cell being built
//! without serializing unrelated resolutions. The resolver adds no locking
//! around a shared instance itself, only around its construction.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::error::{ResolverError, ResolverResult};

/// A resolvable service
///
/// Implement this marker for every registered type; override [`dispose`]
/// when the service holds resources that need cleanup at end of lifetime.
///
/// [`dispose`]: Service::dispose
pub trait Service: Any + Send + Sync {
    /// Release resources held by this service. The default does nothing.
    fn dispose(&self) {}
}

/// Lifetime tag governing sharing and disposal of a registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Eagerly supplied, externally owned instance
    Singleton,
    /// Built on first resolution, process-lifetime
    LazySingleton,
    /// Built at most once per performance scope
    PerScenario,
}

/// Registration key: contract type plus optional discriminator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ServiceKey {
    type_id: TypeId,
    name: Option<String>,
}

#[derive(Clone)]
struct ResolvedService {
    any: Arc<dyn Any + Send + Sync>,
    service: Arc<dyn Service>,
}

fn resolved_from<T: Service>(value: T) -> ResolvedService {
    let arc = Arc::new(value);
    ResolvedService {
        any: arc.clone(),
        service: arc,
    }
}

type ServiceFactory = Box<dyn Fn(&ServiceResolver) -> ResolvedService + Send + Sync>;

enum RegistrationKind {
    Instance(ResolvedService),
    Lazy {
        factory: ServiceFactory,
        cell: OnceCell<ResolvedService>,
    },
    PerScenario {
        factory: ServiceFactory,
    },
}

struct Registration {
    contract: &'static str,
    kind: RegistrationKind,
}

impl Registration {
    fn lifetime(&self) -> ServiceLifetime {
        match self.kind {
            RegistrationKind::Instance(_) => ServiceLifetime::Singleton,
            RegistrationKind::Lazy { .. } => ServiceLifetime::LazySingleton,
            RegistrationKind::PerScenario { .. } => ServiceLifetime::PerScenario,
        }
    }
}

/// Frozen registration table shared by every performance
///
/// Built once (mutably) through the screenplay builder, then only read.
/// Lazy-singleton instances built through it are tracked for teardown.
pub struct ServiceRegistry {
    entries: HashMap<ServiceKey, Registration>,
    lazy_built: Mutex<Vec<Arc<dyn Service>>>,
}

impl ServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lazy_built: Mutex::new(Vec::new()),
        }
    }

    /// Register an externally owned singleton instance
    pub fn register_instance<T: Service>(&mut self, instance: Arc<T>) {
        self.register_instance_keyed_inner(None, instance);
    }

    /// Register an externally owned singleton instance under a key
    pub fn register_instance_keyed<T: Service>(&mut self, key: &str, instance: Arc<T>) {
        self.register_instance_keyed_inner(Some(key.to_string()), instance);
    }

    fn register_instance_keyed_inner<T: Service>(&mut self, name: Option<String>, instance: Arc<T>) {
        let resolved = ResolvedService {
            any: instance.clone(),
            service: instance,
        };
        self.insert::<T>(name, RegistrationKind::Instance(resolved));
    }

    /// Register a lazy singleton: built on first resolution, at most once,
    /// shared process-wide thereafter
    pub fn register_lazy_singleton<T, F>(&mut self, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.register_lazy_singleton_keyed_inner(None, factory);
    }

    /// Register a keyed lazy singleton
    pub fn register_lazy_singleton_keyed<T, F>(&mut self, key: &str, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.register_lazy_singleton_keyed_inner(Some(key.to_string()), factory);
    }

    fn register_lazy_singleton_keyed_inner<T, F>(&mut self, name: Option<String>, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.insert::<T>(
            name,
            RegistrationKind::Lazy {
                factory: Box::new(move |resolver| resolved_from(factory(resolver))),
                cell: OnceCell::new(),
            },
        );
    }

    /// Register a per-scenario service: built at most once per performance
    /// scope, disposed when the scope releases
    pub fn register_per_scenario<T, F>(&mut self, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.register_per_scenario_keyed_inner(None, factory);
    }

    /// Register a keyed per-scenario service
    pub fn register_per_scenario_keyed<T, F>(&mut self, key: &str, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.register_per_scenario_keyed_inner(Some(key.to_string()), factory);
    }

    fn register_per_scenario_keyed_inner<T, F>(&mut self, name: Option<String>, factory: F)
    where
        T: Service,
        F: Fn(&ServiceResolver) -> T + Send + Sync + 'static,
    {
        self.insert::<T>(
            name,
            RegistrationKind::PerScenario {
                factory: Box::new(move |resolver| resolved_from(factory(resolver))),
            },
        );
    }

    fn insert<T: Service>(&mut self, name: Option<String>, kind: RegistrationKind) {
        let key = ServiceKey {
            type_id: TypeId::of::<T>(),
            name,
        };
        self.entries.insert(
            key,
            Registration {
                contract: type_name::<T>(),
                kind,
            },
        );
    }

    /// Lifetime of the registration for `T`, if any. Unkeyed lookup.
    pub fn lifetime_of<T: Service>(&self) -> Option<ServiceLifetime> {
        let key = ServiceKey {
            type_id: TypeId::of::<T>(),
            name: None,
        };
        self.entries.get(&key).map(Registration::lifetime)
    }

    /// Dispose every lazy singleton that was actually built
    ///
    /// Called at process teardown. Externally owned singletons are never
    /// touched; a second call is a no-op.
    pub fn release_lazy_singletons(&self) {
        let built: Vec<_> = self.lazy_built.lock().drain(..).collect();
        for service in built {
            service.dispose();
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One performance's resolution scope
///
/// Holds the per-scenario instance cache; lazy singletons resolve through
/// to the shared registry.
pub struct ServiceResolver {
    registry: Arc<ServiceRegistry>,
    scenario: Mutex<HashMap<ServiceKey, Arc<OnceCell<ResolvedService>>>>,
}

impl ServiceResolver {
    /// Open a new scope over the given registry
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            scenario: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a service by contract type
    ///
    /// Fails with [`ResolverError::NotRegistered`] when no registration for
    /// `T` exists. An unkeyed request falls back to a keyed registration of
    /// the same contract when exactly one exists.
    pub fn resolve<T: Service>(&self) -> ResolverResult<Arc<T>> {
        self.resolve_inner::<T>(None)
    }

    /// Resolve a service by contract type and discriminating key
    pub fn resolve_keyed<T: Service>(&self, key: &str) -> ResolverResult<Arc<T>> {
        self.resolve_inner::<T>(Some(key))
    }

    /// Resolve a service, returning `None` instead of failing when no
    /// registration exists
    pub fn resolve_optional<T: Service>(&self) -> Option<Arc<T>> {
        match self.resolve_inner::<T>(None) {
            Ok(service) => Some(service),
            Err(ResolverError::NotRegistered { .. }) => None,
            // A broken registration is a misconfiguration even on the
            // optional path; surface it loudly.
            Err(err) => {
                tracing::warn!(error = %err, "optional resolution hit a broken registration");
                None
            }
        }
    }

    fn resolve_inner<T: Service>(&self, key: Option<&str>) -> ResolverResult<Arc<T>> {
        let contract = type_name::<T>();
        let requested = ServiceKey {
            type_id: TypeId::of::<T>(),
            name: key.map(str::to_string),
        };

        let (found_key, registration) = self.lookup(&requested, contract)?;
        let resolved = match &registration.kind {
            RegistrationKind::Instance(resolved) => resolved.clone(),
            RegistrationKind::Lazy { factory, cell } => cell
                .get_or_init(|| {
                    let resolved = factory(self);
                    self.registry.lazy_built.lock().push(resolved.service.clone());
                    resolved
                })
                .clone(),
            RegistrationKind::PerScenario { factory } => {
                let cell = self
                    .scenario
                    .lock()
                    .entry(found_key)
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .clone();
                // Construction runs outside the cache lock so factories may
                // recursively resolve other services.
                cell.get_or_init(|| factory(self)).clone()
            }
        };

        resolved
            .any
            .downcast::<T>()
            .map_err(|_| ResolverError::ContractMismatch { contract })
    }

    fn lookup(
        &self,
        requested: &ServiceKey,
        contract: &'static str,
    ) -> ResolverResult<(ServiceKey, &Registration)> {
        if let Some((key, registration)) = self.registry.entries.get_key_value(requested) {
            return Ok((key.clone(), registration));
        }

        if requested.name.is_none() {
            let mut matches = self
                .registry
                .entries
                .iter()
                .filter(|(key, _)| key.type_id == requested.type_id);
            if let (Some((key, registration)), None) = (matches.next(), matches.next()) {
                return Ok((key.clone(), registration));
            }
        }

        Err(ResolverError::NotRegistered { contract })
    }

    /// Dispose every per-scenario instance built during this scope
    ///
    /// Registered-but-never-resolved services are not touched; a second call
    /// is a no-op.
    pub fn release_per_scenario_services(&self) {
        let cells: Vec<_> = self
            .scenario
            .lock()
            .drain()
            .map(|(_, cell)| cell)
            .collect();
        for cell in cells {
            if let Some(resolved) = cell.get() {
                resolved.service.dispose();
            }
        }
    }
}
