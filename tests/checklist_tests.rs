mod common;

use std::time::Duration;

use operator_assist_lib::{
    checklist::{CheckStatus, ChecklistEngine, ChecklistState, Inspection, InspectionOutcome},
    capture::PhotoLog,
    offline::{INSPECTION_COMPLETED_KEY, INSPECTION_CURRENT_KEY},
};

use common::{checklist_fixture, png_bytes, small_inspection};

#[tokio::test]
async fn recording_a_result_persists_and_narrates() {
    let fx = checklist_fixture(small_inspection());

    let check = fx
        .engine
        .record_result("tire-pressure", CheckStatus::Completed)
        .await
        .unwrap();
    assert_eq!(check.status, CheckStatus::Completed);
    assert!(check.completed_at.is_some());
    assert_eq!(fx.synth.last().as_deref(), Some("Tire pressure passed"));

    fx.engine
        .record_result("hyd-leaks", CheckStatus::Failed)
        .await
        .unwrap();
    assert_eq!(fx.synth.last().as_deref(), Some("Hydraulic leaks failed"));

    let saved: ChecklistState =
        serde_json::from_value(fx.store.load(INSPECTION_CURRENT_KEY).await.unwrap()).unwrap();
    assert_eq!(
        saved.inspection.check("hyd-leaks").unwrap().status,
        CheckStatus::Failed
    );
}

#[tokio::test]
async fn terminal_checks_cannot_be_rerecorded() {
    let fx = checklist_fixture(small_inspection());

    fx.engine
        .record_result("tire-tread", CheckStatus::Completed)
        .await
        .unwrap();
    assert!(fx
        .engine
        .record_result("tire-tread", CheckStatus::Failed)
        .await
        .is_err());
    assert!(fx
        .engine
        .record_result("no-such-check", CheckStatus::Completed)
        .await
        .is_err());

    let snapshot = fx.engine.snapshot().await;
    assert_eq!(
        snapshot.inspection.check("tire-tread").unwrap().status,
        CheckStatus::Completed
    );
}

#[tokio::test]
async fn reset_allows_reinspection() {
    let fx = checklist_fixture(small_inspection());

    fx.engine
        .record_result("tire-tread", CheckStatus::Failed)
        .await
        .unwrap();
    fx.engine.reset_check("tire-tread").await.unwrap();
    assert_eq!(fx.synth.last().as_deref(), Some("Tread depth reset"));

    let check = fx
        .engine
        .record_result("tire-tread", CheckStatus::Completed)
        .await
        .unwrap();
    assert_eq!(check.status, CheckStatus::Completed);
}

#[tokio::test]
async fn notes_are_saved_without_changing_status() {
    let fx = checklist_fixture(small_inspection());

    let check = fx
        .engine
        .add_note("hyd-leaks", "weeping at boom cylinder")
        .await
        .unwrap();
    assert_eq!(check.status, CheckStatus::NotStarted);

    let saved: ChecklistState =
        serde_json::from_value(fx.store.load(INSPECTION_CURRENT_KEY).await.unwrap()).unwrap();
    assert_eq!(
        saved.inspection.check("hyd-leaks").unwrap().note.as_deref(),
        Some("weeping at boom cylinder")
    );
}

#[tokio::test]
async fn completion_requires_every_check() {
    let fx = checklist_fixture(small_inspection());

    fx.engine
        .record_result("tire-pressure", CheckStatus::Completed)
        .await
        .unwrap();
    assert!(fx.engine.complete_inspection().await.is_err());
    assert_eq!(fx.store.pending_count().await, 0);
}

#[tokio::test]
async fn one_failure_fails_the_inspection() {
    let fx = checklist_fixture(small_inspection());

    for (id, status) in [
        ("tire-pressure", CheckStatus::Completed),
        ("tire-tread", CheckStatus::Completed),
        ("hyd-leaks", CheckStatus::Failed),
    ] {
        fx.engine.record_result(id, status).await.unwrap();
    }
    assert_eq!(fx.engine.progress().await, 100.0);

    let record = fx.engine.complete_inspection().await.unwrap();
    assert_eq!(record.outcome, InspectionOutcome::Failed);
    assert_eq!(record.failed_checks, vec!["hyd-leaks".to_string()]);
    assert_eq!(
        fx.synth.last().as_deref(),
        Some("Inspection complete. 1 checks failed")
    );

    let saved = fx.store.load(INSPECTION_COMPLETED_KEY).await.unwrap();
    assert_eq!(saved["outcome"], "failed");
    assert_eq!(fx.store.pending_count().await, 1);
}

#[tokio::test]
async fn all_completed_passes() {
    let fx = checklist_fixture(small_inspection());

    for id in ["tire-pressure", "tire-tread", "hyd-leaks"] {
        fx.engine
            .record_result(id, CheckStatus::Completed)
            .await
            .unwrap();
    }

    let record = fx.engine.complete_inspection().await.unwrap();
    assert_eq!(record.outcome, InspectionOutcome::Passed);
    assert!(record.failed_checks.is_empty());
}

#[tokio::test]
async fn an_inspection_completes_only_once() {
    let fx = checklist_fixture(small_inspection());
    for id in ["tire-pressure", "tire-tread", "hyd-leaks"] {
        fx.engine
            .record_result(id, CheckStatus::Completed)
            .await
            .unwrap();
    }

    let record = fx.engine.complete_inspection().await.unwrap();
    let spoken = fx.synth.texts().len();

    assert!(fx.engine.complete_inspection().await.is_err());
    assert_eq!(fx.store.pending_count().await, 1);
    assert_eq!(fx.synth.texts().len(), spoken);

    let saved: ChecklistState =
        serde_json::from_value(fx.store.load(INSPECTION_CURRENT_KEY).await.unwrap()).unwrap();
    assert_eq!(saved.completed_at, Some(record.completed_at));
}

#[tokio::test]
async fn completion_latch_survives_restore() {
    let fx = checklist_fixture(small_inspection());
    for id in ["tire-pressure", "tire-tread", "hyd-leaks"] {
        fx.engine
            .record_result(id, CheckStatus::Completed)
            .await
            .unwrap();
    }
    fx.engine.complete_inspection().await.unwrap();

    let photos = PhotoLog::new(fx.db.clone(), fx.narration.clone(), 8);
    let reopened = ChecklistEngine::new(
        small_inspection(),
        fx.store.clone(),
        fx.narration.clone(),
        photos,
        Duration::from_secs(3),
    );
    assert!(reopened.restore().await);
    assert!(reopened.complete_inspection().await.is_err());
    assert_eq!(fx.store.pending_count().await, 1);
}

#[tokio::test]
async fn an_inspection_without_checks_cannot_complete() {
    let fx = checklist_fixture(Inspection::new("insp-empty", Vec::new()));

    assert_eq!(fx.engine.progress().await, 0.0);
    assert!(fx.engine.complete_inspection().await.is_err());
    assert_eq!(fx.store.pending_count().await, 0);
    assert!(fx.store.load(INSPECTION_COMPLETED_KEY).await.is_none());
    assert!(fx.synth.texts().is_empty());
}

#[tokio::test]
async fn section_navigation_is_clamped_and_announced() {
    let fx = checklist_fixture(small_inspection());

    assert_eq!(fx.engine.retreat_section().await.as_deref(), Some("Tires"));
    assert_eq!(fx.engine.advance_section().await.as_deref(), Some("Hydraulics"));
    assert_eq!(fx.engine.advance_section().await.as_deref(), Some("Hydraulics"));
    assert_eq!(fx.engine.snapshot().await.current_section, 1);
    assert_eq!(fx.synth.texts(), vec!["Tires", "Hydraulics", "Hydraulics"]);
}

#[tokio::test(start_paused = true)]
async fn voice_guide_walks_prompts_until_section_changes() {
    let fx = checklist_fixture(small_inspection());

    assert_eq!(fx.engine.voice_guide().await, 2);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fx.synth.texts(), vec!["Tire pressure"]);
    assert!(fx.engine.is_guiding().await);

    fx.engine.advance_section().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(fx.synth.texts(), vec!["Tire pressure", "Hydraulics"]);
    assert!(!fx.engine.is_guiding().await);
}

#[tokio::test(start_paused = true)]
async fn voice_guide_reads_whole_section() {
    let fx = checklist_fixture(small_inspection());

    fx.engine.voice_guide().await;
    tokio::time::sleep(Duration::from_millis(3_001)).await;

    assert_eq!(fx.synth.texts(), vec!["Tire pressure", "Tread depth"]);
}

#[tokio::test]
async fn restore_rehydrates_saved_inspection() {
    let fx = checklist_fixture(small_inspection());
    fx.engine
        .record_result("tire-pressure", CheckStatus::Completed)
        .await
        .unwrap();
    fx.engine.advance_section().await;

    let photos = PhotoLog::new(fx.db.clone(), fx.narration.clone(), 8);
    let reopened = ChecklistEngine::new(
        small_inspection(),
        fx.store.clone(),
        fx.narration.clone(),
        photos,
        Duration::from_secs(3),
    );
    assert!(reopened.restore().await);

    let state = reopened.snapshot().await;
    assert_eq!(state.current_section, 1);
    assert_eq!(
        state.inspection.check("tire-pressure").unwrap().status,
        CheckStatus::Completed
    );
}

#[tokio::test]
async fn restore_without_saved_state_keeps_fresh_inspection() {
    let fx = checklist_fixture(small_inspection());
    assert!(!fx.engine.restore().await);
    assert_eq!(fx.engine.progress().await, 0.0);
}

#[tokio::test]
async fn photos_attach_to_known_checks() {
    let fx = checklist_fixture(small_inspection());

    let first = fx
        .engine
        .attach_photo("tire-tread", png_bytes(48, 32, 3))
        .await
        .unwrap();
    assert_eq!((first.width, first.height), (48, 32));
    assert_eq!(first.format, "png");
    assert_eq!(first.duplicate_of, None);
    assert_eq!(fx.synth.last().as_deref(), Some("Photo saved"));

    let retake = fx
        .engine
        .attach_photo("tire-tread", png_bytes(48, 32, 3))
        .await
        .unwrap();
    assert_eq!(retake.duplicate_of.as_deref(), Some(first.id.as_str()));

    assert!(fx
        .engine
        .attach_photo("brakes", png_bytes(8, 8, 1))
        .await
        .is_err());
}

#[tokio::test]
async fn non_images_are_rejected_aloud() {
    let fx = checklist_fixture(small_inspection());

    assert!(fx
        .engine
        .attach_photo("mirrors-do-not-exist", b"%PDF-1.4".to_vec())
        .await
        .is_err());

    assert!(fx
        .engine
        .attach_photo("tire-tread", b"just some text".to_vec())
        .await
        .is_err());
    assert_eq!(fx.synth.last().as_deref(), Some("Invalid file selected"));
}
