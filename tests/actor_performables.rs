//! Actor performable-execution tests
//!
//! Verifies that begin/end events are emitted as matching pairs on success
//! and failure, that results are relayed before the end event, and that a
//! panicking report formatter degrades to a fallback string instead of
//! taking down the execution path.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use screenplay::screenplay::actor::Actor;
use screenplay::screenplay::error::{Result, ScreenplayError};
use screenplay::screenplay::events::{EventBus, EventListener, PerformanceEvent};
use screenplay::screenplay::performable::{Performable, Question};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Recorder {
    events: Mutex<Vec<PerformanceEvent>>,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn snapshot(&self) -> Vec<PerformanceEvent> {
        self.events.lock().clone()
    }
}

impl EventListener for Recorder {
    fn handle(&self, event: &PerformanceEvent) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

fn wired_actor() -> (Actor, Arc<Recorder>) {
    let bus = Arc::new(EventBus::new());
    let recorder = Recorder::new();
    bus.subscribe(recorder.clone());
    (Actor::new("Joe", Uuid::new_v4(), bus), recorder)
}

struct Shrug;

#[async_trait]
impl Performable for Shrug {
    fn report(&self, actor: &Actor) -> String {
        format!("{} shrugs", actor.name())
    }

    async fn perform_as(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }
}

struct Trip;

#[async_trait]
impl Performable for Trip {
    fn report(&self, actor: &Actor) -> String {
        format!("{} trips over", actor.name())
    }

    async fn perform_as(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        Err(ScreenplayError::Scenario(anyhow::anyhow!("stage was wet")))
    }
}

struct CountFingers;

#[async_trait]
impl Question for CountFingers {
    type Answer = u32;

    fn report(&self, actor: &Actor) -> String {
        format!("{} counts fingers", actor.name())
    }

    async fn answer_as(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<u32> {
        Ok(10)
    }
}

struct BrokenReport;

#[async_trait]
impl Performable for BrokenReport {
    fn report(&self, _actor: &Actor) -> String {
        panic!("formatter bug")
    }

    async fn perform_as(&self, _actor: &Actor, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn successful_performable_emits_begin_then_end() {
    let (actor, recorder) = wired_actor();

    actor.perform(&Shrug, &CancellationToken::new()).await.unwrap();

    let events = recorder.snapshot();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        PerformanceEvent::BeginPerformable { report, .. } if report == "Joe shrugs"
    ));
    assert!(matches!(
        &events[1],
        PerformanceEvent::EndPerformable { success: true, .. }
    ));
}

#[tokio::test]
async fn failing_performable_still_emits_end() {
    let (actor, recorder) = wired_actor();

    let err = actor
        .perform(&Trip, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("stage was wet"));

    let events = recorder.snapshot();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        PerformanceEvent::EndPerformable { success: false, .. }
    ));
}

#[tokio::test]
async fn question_emits_result_between_begin_and_end() {
    let (actor, recorder) = wired_actor();

    let answer = actor
        .perform_and_get(&CountFingers, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(answer, 10);

    let events = recorder.snapshot();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], PerformanceEvent::BeginPerformable { .. }));
    assert!(matches!(
        &events[1],
        PerformanceEvent::PerformableResult { result, .. } if result == "10"
    ));
    assert!(matches!(
        &events[2],
        PerformanceEvent::EndPerformable { success: true, .. }
    ));
}

#[tokio::test]
async fn broken_report_degrades_to_fallback_string() {
    let (actor, recorder) = wired_actor();

    actor
        .perform(&BrokenReport, &CancellationToken::new())
        .await
        .unwrap();

    let events = recorder.snapshot();
    match &events[0] {
        PerformanceEvent::BeginPerformable { report, .. } => {
            assert!(report.contains("error formatting"));
            assert!(report.contains("BrokenReport"));
        }
        other => panic!("expected BeginPerformable, got {other:?}"),
    }
}

#[tokio::test]
async fn gained_ability_is_announced() {
    let (actor, recorder) = wired_actor();

    struct Megaphone;
    actor.is_able_to(Megaphone);

    let events = recorder.snapshot();
    assert_eq!(events.len(), 1);
    match &events[0] {
        PerformanceEvent::GainedAbility { actor, ability, .. } => {
            assert_eq!(actor, "Joe");
            assert!(ability.contains("Megaphone"));
        }
        other => panic!("expected GainedAbility, got {other:?}"),
    }
}
