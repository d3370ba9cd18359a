use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{voice::Voice, UtteranceEvents};

// Set to true to trace playback on the console engine thread
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

/// Platform text-to-speech engine.
///
/// `speak` must not block on playback. The engine reports progress through
/// `events` (start, then end or failure); reports for an utterance that was
/// since preempted are ignored by the narration service.
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&self, utterance: Utterance, events: UtteranceEvents);
    fn cancel(&self);
}

enum SpeechCommand {
    Speak {
        utterance: Utterance,
        events: UtteranceEvents,
        generation: u64,
    },
}

const BASE_WORDS_PER_MINUTE: f32 = 150.0;
const PLAYBACK_SLICE: Duration = Duration::from_millis(50);

/// Terminal "speaker": prints each utterance and holds the engine busy for
/// roughly as long as reading it aloud would take, so preemption behaves the
/// way it does on a device.
pub struct ConsoleSynthesizer {
    tx: Mutex<Option<Sender<SpeechCommand>>>,
    generation: Arc<AtomicU64>,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<SpeechCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("speech engine lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<SpeechCommand>();
        let generation = Arc::clone(&self.generation);

        thread::Builder::new()
            .name("speech-engine".to_string())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        SpeechCommand::Speak {
                            utterance,
                            events,
                            generation: issued_at,
                        } => {
                            if generation.load(Ordering::SeqCst) != issued_at {
                                continue;
                            }
                            play(&utterance, &events, &generation, issued_at);
                        }
                    }
                }
            })
            .map_err(|err| anyhow!("failed to spawn speech engine thread: {err}"))?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn play(utterance: &Utterance, events: &UtteranceEvents, generation: &AtomicU64, issued_at: u64) {
    events.started();
    println!("🔊 {}", utterance.text);

    let words = utterance.text.split_whitespace().count().max(1) as f32;
    let minutes = words / (BASE_WORDS_PER_MINUTE * utterance.rate.max(0.1));
    let total = Duration::from_secs_f32(minutes * 60.0);

    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        if generation.load(Ordering::SeqCst) != issued_at {
            log_debug!("utterance {} interrupted", utterance.id);
            return;
        }
        thread::sleep(PLAYBACK_SLICE);
        elapsed += PLAYBACK_SLICE;
    }

    events.ended();
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Console", "en-US")]
    }

    fn speak(&self, utterance: Utterance, events: UtteranceEvents) {
        let generation = self.generation.load(Ordering::SeqCst);
        let sender = match self.ensure_thread() {
            Ok(sender) => sender,
            Err(err) => {
                log_error!("speech engine unavailable: {err}");
                events.failed(&err.to_string());
                return;
            }
        };

        let command = SpeechCommand::Speak {
            utterance,
            events: events.clone(),
            generation,
        };
        if sender.send(command).is_err() {
            events.failed("speech engine thread exited");
        }
    }

    fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
