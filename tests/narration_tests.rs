mod common;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc, Mutex,
};
use std::thread;
use std::time::Duration;

use operator_assist_lib::{
    capabilities::Capability,
    narration::{
        NarrationService, SpeakOptions, SpeechSynthesizer, Utterance, UtteranceEvents,
        ViewSnapshots, Voice,
    },
    settings::NarrationSettings,
};

use common::{narration_with, RecordingSynth};

#[tokio::test]
async fn newer_speak_preempts_older() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    let first = narration.speak("A").unwrap();
    let second = narration.speak("B").unwrap();

    assert_ne!(first, second);
    assert_eq!(synth.texts(), vec!["A", "B"]);
    assert_eq!(synth.cancel_count(), 2);

    let status = narration.status();
    assert!(status.speaking);
    assert_eq!(status.utterance_id, Some(second));
    assert_eq!(status.text.as_deref(), Some("B"));
}

#[tokio::test]
async fn end_event_clears_speaking_flag() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    narration.speak("Engine oil level");
    assert!(narration.is_speaking());

    synth.finish_current();
    assert!(!narration.is_speaking());
}

#[tokio::test]
async fn events_from_preempted_utterance_are_ignored() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    narration.speak("first");
    narration.speak("second");
    assert!(narration.is_speaking());

    synth.finish_nth(0);
    assert!(narration.is_speaking());
    assert_eq!(narration.status().text.as_deref(), Some("second"));

    synth.finish_nth(1);
    assert!(!narration.is_speaking());
}

#[tokio::test]
async fn blank_text_is_not_spoken() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    assert_eq!(narration.speak("   "), None);
    assert_eq!(narration.speak(""), None);
    assert!(synth.texts().is_empty());
}

#[tokio::test]
async fn unsupported_narration_is_a_no_op() {
    let narration = NarrationService::disabled();
    assert!(!narration.is_supported());
    assert_eq!(narration.speak("hello"), None);
    assert!(narration
        .narrate_sequence(vec!["a".into()], Duration::from_secs(1))
        .is_none());
    narration.stop();
    assert!(!narration.is_speaking());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    narration.speak("Hydraulics");
    narration.stop();
    narration.stop();

    let status = narration.status();
    assert!(!status.speaking);
    assert_eq!(status.utterance_id, None);
}

/// Synthesizer whose next cancel reports in and then stalls, widening the
/// window between a stop starting and finishing.
struct StallingSynth {
    stall_next_cancel: AtomicBool,
    cancel_entered: Mutex<mpsc::Sender<()>>,
}

impl SpeechSynthesizer for StallingSynth {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn speak(&self, _utterance: Utterance, events: UtteranceEvents) {
        events.started();
    }

    fn cancel(&self) {
        if self.stall_next_cancel.swap(false, Ordering::SeqCst) {
            self.cancel_entered.lock().unwrap().send(()).unwrap();
            thread::sleep(Duration::from_millis(200));
        }
    }
}

#[test]
fn speak_racing_a_stop_is_not_wiped() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let synth = Arc::new(StallingSynth {
        stall_next_cancel: AtomicBool::new(false),
        cancel_entered: Mutex::new(entered_tx),
    });
    let narration = NarrationService::new(
        Capability::Available(synth.clone() as Arc<dyn SpeechSynthesizer>),
        Capability::Unavailable,
        NarrationSettings::default(),
    );
    narration.speak("Boom lowered");

    synth.stall_next_cancel.store(true, Ordering::SeqCst);
    let stopper = {
        let narration = narration.clone();
        thread::spawn(move || narration.stop())
    };
    entered_rx.recv().unwrap();

    let id = narration.speak("Swing clear").unwrap();
    stopper.join().unwrap();

    let status = narration.status();
    assert_eq!(status.utterance_id, Some(id));
    assert_eq!(status.text.as_deref(), Some("Swing clear"));
    assert!(status.speaking);
}

#[tokio::test]
async fn options_pick_enhanced_voice_and_clamp_values() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    narration.speak_with(
        "Checking tires",
        &SpeakOptions::default().with_rate(25.0).with_lang("en"),
    );

    let utterance = synth.utterances().pop().unwrap();
    assert_eq!(utterance.rate, 10.0);
    assert_eq!(utterance.pitch, 1.0);
    assert_eq!(utterance.volume, 1.0);
    assert_eq!(
        utterance.voice.map(|voice| voice.name),
        Some("Samantha (Enhanced)".to_string())
    );
}

#[tokio::test]
async fn default_rate_is_slowed_for_the_cab() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    narration.speak("Mirrors");
    let utterance = synth.utterances().pop().unwrap();
    assert!((utterance.rate - 0.8).abs() < f32::EPSILON);
    assert_eq!(utterance.lang, "en");
}

#[tokio::test]
async fn reads_main_region_and_falls_back_to_body() {
    let synth = Arc::new(RecordingSynth::default());
    let views = Arc::new(ViewSnapshots::new());
    let narration = narration_with(&synth, Some(views.clone()));

    views.publish("body", "Whole   page\n text");
    narration.read_current_view(None);
    assert_eq!(synth.last().as_deref(), Some("Whole page text"));

    views.publish("main", "Engine Hours: 1,240 h (ok)!");
    narration.read_current_view(None);
    assert_eq!(synth.last().as_deref(), Some("Engine Hours 1,240 h ok!"));
}

#[tokio::test]
async fn reading_without_a_view_source_says_nothing() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    assert_eq!(narration.read_current_view(None), None);
    assert!(synth.texts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn sequence_speaks_items_at_interval() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    let sequence = narration
        .narrate_sequence(
            vec!["one".into(), "two".into(), "three".into()],
            Duration::from_secs(3),
        )
        .unwrap();
    assert_eq!(sequence.len(), 3);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(synth.texts(), vec!["one"]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(synth.texts(), vec!["one", "two"]);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(synth.texts(), vec!["one", "two", "three"]);

    sequence.finished().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn direct_speak_cancels_running_sequence() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    let sequence = narration
        .narrate_sequence(vec!["one".into(), "two".into()], Duration::from_secs(3))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    narration.speak("interrupt");
    assert!(sequence.is_cancelled());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(synth.texts(), vec!["one", "interrupt"]);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_sequence() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    let sequence = narration
        .narrate_sequence(vec!["one".into(), "two".into()], Duration::from_secs(3))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    narration.stop();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(sequence.is_cancelled());
    assert_eq!(synth.texts(), vec!["one"]);
}

#[tokio::test(start_paused = true)]
async fn new_sequence_replaces_old_one() {
    let synth = Arc::new(RecordingSynth::default());
    let narration = narration_with(&synth, None);

    let first = narration
        .narrate_sequence(vec!["a1".into(), "a2".into()], Duration::from_secs(3))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;

    let _second = narration
        .narrate_sequence(vec!["b1".into(), "b2".into()], Duration::from_secs(3))
        .unwrap();
    assert!(first.is_cancelled());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(synth.texts(), vec!["a1", "b1", "b2"]);
}
