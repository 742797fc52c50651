//! Hierarchical resolution scopes for test-runner adapters
//!
//! Parallel test runners resolve services through a chain of scopes
//! (test-run → worker → feature); each scope carries its own registrations
//! and an optional one-time setup. Setup runs lazily, the first time any
//! service in the scope is requested, serialized under a per-scope cell so
//! concurrent first requests from parallel scenarios cannot run it twice.
//! Parent scopes are always set up before their children.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::error::{ResolverError, ResolverResult};
use super::resolver::{Service, ServiceRegistry, ServiceResolver};

/// Level of a resolution scope in the runner hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeLevel {
    /// Whole test run; outermost scope
    TestRun,
    /// One parallel worker
    Worker,
    /// One feature/fixture
    Feature,
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScopeLevel::TestRun => "test-run",
            ScopeLevel::Worker => "worker",
            ScopeLevel::Feature => "feature",
        };
        f.write_str(label)
    }
}

/// One-time setup hook run before the first resolution in a scope
pub type ScopeSetup = Box<dyn FnOnce(&ServiceResolver) -> anyhow::Result<()> + Send>;

/// A node in the scope hierarchy
pub struct ScopedServices {
    level: ScopeLevel,
    parent: Option<Arc<ScopedServices>>,
    resolver: ServiceResolver,
    setup: Mutex<Option<ScopeSetup>>,
    ready: OnceCell<()>,
    setup_error: OnceCell<String>,
}

impl ScopedServices {
    /// Create a root scope
    pub fn root(
        level: ScopeLevel,
        registry: Arc<ServiceRegistry>,
        setup: Option<ScopeSetup>,
    ) -> Arc<Self> {
        Arc::new(Self {
            level,
            parent: None,
            resolver: ServiceResolver::new(registry),
            setup: Mutex::new(setup),
            ready: OnceCell::new(),
            setup_error: OnceCell::new(),
        })
    }

    /// Create a child scope under `parent`
    pub fn child(
        parent: &Arc<ScopedServices>,
        level: ScopeLevel,
        registry: Arc<ServiceRegistry>,
        setup: Option<ScopeSetup>,
    ) -> Arc<Self> {
        Arc::new(Self {
            level,
            parent: Some(parent.clone()),
            resolver: ServiceResolver::new(registry),
            setup: Mutex::new(setup),
            ready: OnceCell::new(),
            setup_error: OnceCell::new(),
        })
    }

    /// This scope's level
    pub fn level(&self) -> ScopeLevel {
        self.level
    }

    /// Resolve a service, searching this scope then its ancestors
    ///
    /// Every scope on the search path is set up (once) before being
    /// searched. Failure names the missing contract and the scope level the
    /// search started from.
    pub fn resolve<T: Service>(&self) -> ResolverResult<Arc<T>> {
        self.ensure_ready()?;
        if let Some(service) = self.resolver.resolve_optional::<T>() {
            return Ok(service);
        }

        let mut ancestor = self.parent.as_ref();
        while let Some(scope) = ancestor {
            if let Some(service) = scope.resolver.resolve_optional::<T>() {
                return Ok(service);
            }
            ancestor = scope.parent.as_ref();
        }

        Err(ResolverError::NotRegisteredInScope {
            contract: type_name::<T>(),
            scope: self.level,
        })
    }

    /// Direct access to this scope's resolver (no ancestor search)
    pub fn resolver(&self) -> &ServiceResolver {
        &self.resolver
    }

    /// Dispose instances built in this scope. Ancestors are untouched.
    pub fn release(&self) {
        self.resolver.release_per_scenario_services();
    }

    /// Run this scope's one-time setup if it has not run yet, parents first
    fn ensure_ready(&self) -> ResolverResult<()> {
        if let Some(parent) = &self.parent {
            parent.ensure_ready()?;
        }

        if let Some(detail) = self.setup_error.get() {
            return Err(ResolverError::ScopeSetupFailed {
                scope: self.level,
                detail: detail.clone(),
            });
        }

        self.ready
            .get_or_try_init(|| {
                let setup = self.setup.lock().take();
                if let Some(setup) = setup {
                    setup(&self.resolver).map_err(|err| {
                        let detail = err.to_string();
                        let _ = self.setup_error.set(detail.clone());
                        ResolverError::ScopeSetupFailed {
                            scope: self.level,
                            detail,
                        }
                    })?;
                }
                Ok(())
            })
            .map(|_| ())
    }
}
