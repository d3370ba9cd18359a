//! Hands-free navigation between the operator views.

pub mod commands;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use log::{info, warn};
use tokio::sync::watch;

use crate::{capabilities::Capability, narration::NarrationService};

pub use commands::{parse_command, View, VoiceCommand};

pub const NOT_SUPPORTED: &str = "Voice control is not supported on this device";
pub const NOT_RECOGNIZED: &str = "Command not recognized. Try saying dashboard, inspection, or jobs.";

/// Single-shot speech recognizer: after `start`, the next transcript is
/// delivered to [`VoiceControl::handle_transcript`] and listening ends.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self) -> Result<()>;
    fn stop(&self);
}

#[derive(Clone)]
pub struct VoiceControl {
    recognizer: Capability<dyn SpeechRecognizer>,
    narration: NarrationService,
    listening: Arc<AtomicBool>,
    view: Arc<watch::Sender<View>>,
}

impl VoiceControl {
    pub fn new(recognizer: Capability<dyn SpeechRecognizer>, narration: NarrationService) -> Self {
        let (view, _) = watch::channel(View::default());
        Self {
            recognizer,
            narration,
            listening: Arc::new(AtomicBool::new(false)),
            view: Arc::new(view),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_available()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn current_view(&self) -> View {
        *self.view.borrow()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.view.subscribe()
    }

    /// Starts or stops listening. Returns whether the recognizer is now listening.
    pub fn toggle(&self) -> bool {
        let Some(recognizer) = self.recognizer.get() else {
            self.narration.speak(NOT_SUPPORTED);
            return false;
        };

        if self.listening.swap(false, Ordering::SeqCst) {
            recognizer.stop();
            return false;
        }

        match recognizer.start() {
            Ok(()) => {
                self.listening.store(true, Ordering::SeqCst);
                true
            }
            Err(err) => {
                warn!("Speech recognition failed to start: {err:?}");
                false
            }
        }
    }

    /// Acts on a recognized phrase.
    pub fn handle_transcript(&self, transcript: &str) -> VoiceCommand {
        self.listening.store(false, Ordering::SeqCst);

        let command = parse_command(transcript);
        info!("Voice command {command:?} from {transcript:?}");

        match command {
            VoiceCommand::Navigate(view) => {
                self.view.send_replace(view);
                self.narration.speak(view.label());
            }
            VoiceCommand::ReadView => {
                self.narration.read_current_view(None);
            }
            VoiceCommand::Unrecognized => {
                self.narration.speak(NOT_RECOGNIZED);
            }
        }
        command
    }

    /// Switches views without voice, e.g. from a button; announces the view.
    pub fn navigate(&self, view: View) {
        self.view.send_replace(view);
        self.narration.speak(view.label());
    }
}
