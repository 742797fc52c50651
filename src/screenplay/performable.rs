//! Performables: tasks and questions executed by actors
//!
//! A performable is a value-like, composable unit of behavior. Tasks
//! ([`Performable`]) produce no value; questions ([`Question`]) produce a
//! typed answer. Both render a human-readable report used purely for
//! observability.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::actor::Actor;
use super::error::Result;

/// A unit of behavior an actor can execute
///
/// Implementations may compose: a performable is free to drive
/// sub-performables through the actor it receives.
#[async_trait]
pub trait Performable: Send + Sync {
    /// Render a human-readable report line for this performable
    fn report(&self, actor: &Actor) -> String;

    /// Execute as the given actor. The cancellation token is signalled when
    /// the owning performance passes its deadline; cooperative performables
    /// should stop work once it is cancelled.
    async fn perform_as(&self, actor: &Actor, cancel: &CancellationToken) -> Result<()>;
}

/// A performable that produces a typed answer
#[async_trait]
pub trait Question: Send + Sync {
    /// Value produced by the question
    type Answer: fmt::Debug + Send;

    /// Render a human-readable report line for this question
    fn report(&self, actor: &Actor) -> String;

    /// Execute as the given actor, producing the answer
    async fn answer_as(&self, actor: &Actor, cancel: &CancellationToken)
    -> Result<Self::Answer>;
}

/// Render a report string, degrading to a fallback on panic
///
/// Report rendering is observability-only and must never take down the
/// execution path; a panicking formatter is replaced with a fallback string
/// that still identifies the performable's type.
pub(crate) fn render_report<F>(performable_type: &'static str, render: F) -> String
where
    F: FnOnce() -> String,
{
    match catch_unwind(AssertUnwindSafe(render)) {
        Ok(report) => report,
        Err(_) => format!("error formatting report for {performable_type}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report_passthrough() {
        let report = render_report("demo::Task", || "Joe does a thing".to_string());
        assert_eq!(report, "Joe does a thing");
    }

    #[test]
    fn test_render_report_fallback_names_type() {
        let report = render_report("demo::Task", || panic!("formatter bug"));
        assert!(report.contains("demo::Task"));
        assert!(report.contains("error formatting"));
    }
}
