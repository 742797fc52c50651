//! End-to-end stopwatch scenario
//!
//! Runs a complete performance through the façade: an actor gains the
//! stopwatch ability, times a wait, and the readings satisfy tolerant
//! wall-clock bounds. Stopped readings are exact and repeatable; resetting
//! while stopped yields zero.

use std::time::Duration;

use screenplay::Screenplay;
use screenplay::screenplay::performance::IdentifierAndName;
use screenplay::screenplay::stopwatch::{
    ReadTheStopwatch, ResetTheStopwatch, StartTheStopwatch, StopTheStopwatch, UseAStopwatch,
};

#[tokio::test]
async fn timed_wait_scenario() {
    let screenplay = Screenplay::builder().build();
    screenplay.start();

    let verdict = screenplay
        .execute_as_performance(
            vec![IdentifierAndName::new(
                "timing/stopwatch",
                Some("Joe times a wait".into()),
            )],
            Some(Duration::from_secs(5)),
            |performance| async move {
                let joe = performance.cast().actor("Joe");
                joe.is_able_to(UseAStopwatch::new());
                let cancel = performance.cancellation_token().clone();

                joe.perform(&StartTheStopwatch, &cancel).await?;
                tokio::time::sleep(Duration::from_millis(150)).await;
                let elapsed = joe.perform_and_get(&ReadTheStopwatch, &cancel).await?;

                assert!(elapsed > Duration::from_millis(145), "read {elapsed:?}");
                assert!(elapsed < Duration::from_millis(500), "read {elapsed:?}");

                joe.perform(&StopTheStopwatch, &cancel).await?;
                let first = joe.perform_and_get(&ReadTheStopwatch, &cancel).await?;
                let second = joe.perform_and_get(&ReadTheStopwatch, &cancel).await?;
                assert_eq!(first, second);

                joe.perform(&ResetTheStopwatch, &cancel).await?;
                let zeroed = joe.perform_and_get(&ReadTheStopwatch, &cancel).await?;
                assert_eq!(zeroed, Duration::ZERO);

                Ok(Some(true))
            },
        )
        .await
        .unwrap();

    assert_eq!(verdict, Some(true));
    screenplay.finish();
}

#[tokio::test]
async fn reading_without_the_ability_fails_the_scenario() {
    let screenplay = Screenplay::builder().build();

    let err = screenplay
        .execute_as_performance(
            vec![IdentifierAndName::new("timing/no-ability", None)],
            None,
            |performance| async move {
                let pam = performance.cast().actor("Pam");
                let cancel = performance.cancellation_token().clone();
                let _ = pam.perform_and_get(&ReadTheStopwatch, &cancel).await?;
                Ok(Some(true))
            },
        )
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Pam"));
    assert!(message.contains("UseAStopwatch"));
}
