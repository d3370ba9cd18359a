mod common;

use std::sync::Arc;
use std::time::Duration;

use operator_assist_lib::alerts::{standard_alerts, AlertLevel, AlertMonitor};

use common::{narration_with, RecordingSynth};

fn monitor(synth: &Arc<RecordingSynth>) -> AlertMonitor {
    AlertMonitor::new(narration_with(synth, None), Duration::from_millis(500))
}

#[tokio::test(start_paused = true)]
async fn new_alert_is_read_once_after_the_delay() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);

    alerts
        .raise(AlertLevel::Danger, "Engine temperature high", 3)
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(synth.texts().is_empty());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(synth.texts(), vec!["Engine temperature high"]);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(synth.texts().len(), 1);
    assert!(alerts.priority_alert().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn most_urgent_unheard_alert_is_read_first() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);

    alerts
        .raise(AlertLevel::Warning, "Scheduled maintenance due", 1)
        .await;
    alerts
        .raise(AlertLevel::Danger, "Engine temperature high", 3)
        .await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        synth.texts(),
        vec!["Engine temperature high", "Scheduled maintenance due"]
    );
}

#[tokio::test(start_paused = true)]
async fn speak_all_reads_every_alert_and_marks_them_heard() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);
    for (level, message, priority) in standard_alerts() {
        alerts.raise(level, message, priority).await;
    }

    let summary = alerts.speak_all().await;
    assert_eq!(
        summary,
        "3 active alerts: Engine temperature high. Hydraulic fluid low. Scheduled maintenance due"
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(synth.texts(), vec![summary]);
}

#[tokio::test]
async fn speak_all_without_alerts() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);

    assert_eq!(alerts.speak_all().await, "No active alerts");
    assert_eq!(synth.last().as_deref(), Some("No active alerts"));
}

#[tokio::test(start_paused = true)]
async fn heard_alerts_can_be_repeated_on_request() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);
    let alert = alerts
        .raise(AlertLevel::Warning, "Hydraulic fluid low", 2)
        .await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    alerts.speak_alert(alert.id).await.unwrap();
    assert_eq!(
        synth.texts(),
        vec!["Hydraulic fluid low", "Hydraulic fluid low"]
    );
    assert!(alerts.speak_alert(99).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn dismissed_alerts_are_not_announced() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);
    let alert = alerts
        .raise(AlertLevel::Info, "Weather: heavy rain in zone B", 1)
        .await;

    alerts.dismiss(alert.id).await.unwrap();
    assert!(alerts.dismiss(alert.id).await.is_err());
    assert_eq!(alerts.active_count().await, 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(synth.texts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_pending_announcements() {
    let synth = Arc::new(RecordingSynth::default());
    let alerts = monitor(&synth);
    alerts
        .raise(AlertLevel::Danger, "Engine temperature high", 3)
        .await;

    alerts.shutdown();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(synth.texts().is_empty());
    assert_eq!(alerts.active_count().await, 1);
}
