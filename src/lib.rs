//! Screenplay – an actor-based acceptance-test orchestration core
//!
//! This crate implements the engine layer of the Screenplay pattern:
//! - Named actors holding typed abilities and executing composable performables
//! - A cast/stage registry producing one actor per name or persona
//! - Per-scenario performances with a strict lifecycle state machine
//! - Deadline-enforced scenario execution with cooperative cancellation
//! - A decoupled event bus feeding reporting and diagnostics
//! - A scoped service resolver with singleton / lazy-singleton / per-scenario
//!   lifetimes and disposal bookkeeping
//!
//! Browser automation, API clients, report rendering, and test-runner
//! adapters are external collaborators built on top of these abstractions.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Core modules implementing the Screenplay orchestration engine
pub mod screenplay;

// Re-export key types for convenience
pub use screenplay::{Screenplay, ScreenplayBuilder};

/// Current version of the Screenplay core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
