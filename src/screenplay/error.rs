//! Error types for the Screenplay core
//!
//! Domain errors use thiserror; scenario logic crosses the boundary as
//! `anyhow::Error` and is wrapped at the performance driver.

use std::time::Duration;
use thiserror::Error;

use super::performance::PerformanceState;
use super::scope::ScopeLevel;

/// Top-level Screenplay error
#[derive(Debug, Error)]
pub enum ScreenplayError {
    /// Ability lookup errors
    #[error("Ability error: {0}")]
    Ability(#[from] AbilityError),

    /// Service resolution errors
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Performance lifecycle errors
    #[error("Performance error: {0}")]
    Performance(#[from] PerformanceError),

    /// Failure raised by scenario or performable logic
    #[error("Scenario logic failed: {0}")]
    Scenario(anyhow::Error),
}

/// Ability lookup errors
#[derive(Debug, Error)]
pub enum AbilityError {
    /// Actor does not hold an ability of the requested capability type.
    /// A test-authoring mistake, never retried.
    #[error("Actor '{actor}' does not have the ability {ability_type}")]
    Missing {
        /// Name of the actor the lookup was made on
        actor: String,
        /// Requested capability type
        ability_type: &'static str,
    },
}

/// Convenience result alias for ability operations
pub type AbilityResult<T> = std::result::Result<T, AbilityError>;

/// Service resolution errors
#[derive(Debug, Error)]
pub enum ResolverError {
    /// No registration exists for the requested contract type
    #[error("No service registered for contract {contract}")]
    NotRegistered {
        /// Requested contract type
        contract: &'static str,
    },

    /// No registration exists for the requested contract in a scope chain
    #[error("No service registered for contract {contract} searching from the {scope} scope")]
    NotRegisteredInScope {
        /// Requested contract type
        contract: &'static str,
        /// Scope level the search started from
        scope: ScopeLevel,
    },

    /// A registration produced an instance of the wrong concrete type
    #[error("Registration for contract {contract} produced a mismatched instance")]
    ContractMismatch {
        /// Requested contract type
        contract: &'static str,
    },

    /// One-time scope setup failed
    #[error("Setup of the {scope} scope failed: {detail}")]
    ScopeSetupFailed {
        /// Scope level whose setup failed
        scope: ScopeLevel,
        /// Failure details
        detail: String,
    },
}

/// Convenience result alias for resolver operations
pub type ResolverResult<T> = std::result::Result<T, ResolverError>;

/// Performance lifecycle errors
#[derive(Debug, Error)]
pub enum PerformanceError {
    /// State machine misuse, indicates an adapter bug
    #[error("Invalid transition: cannot {attempted} a performance that is {from}")]
    InvalidTransition {
        /// State the performance was in
        from: PerformanceState,
        /// Attempted operation
        attempted: &'static str,
    },

    /// The performance exceeded its deadline. Distinguished from a generic
    /// failure so adapters can report it as a timeout.
    #[error("Performance timed out after {timeout:?}")]
    TimedOut {
        /// Deadline that elapsed
        timeout: Duration,
    },
}

/// Convenience result alias for performance operations
pub type PerformanceResult<T> = std::result::Result<T, PerformanceError>;

/// Result type using ScreenplayError
pub type Result<T> = std::result::Result<T, ScreenplayError>;
