//! Text-to-speech narration with a single active utterance.
//!
//! Every `speak` preempts whatever is playing (last request wins, nothing is
//! queued). Timed walkthroughs go through [`NarrationService::narrate_sequence`],
//! which any other narration cancels.

pub mod sequence;
pub mod synth;
pub mod view;
pub mod voice;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, RwLock, Weak,
};
use std::time::Duration;

use serde::Serialize;
use tokio::{sync::watch, time};
use tokio_util::sync::CancellationToken;

use crate::{capabilities::Capability, settings::NarrationSettings, utils::text::speakable};

pub use sequence::NarrationSequence;
pub use synth::{ConsoleSynthesizer, SpeechSynthesizer, Utterance};
pub use view::{ViewSnapshots, ViewTextSource, PRIMARY_REGION, WHOLE_VIEW};
pub use voice::{choose_voice, ResolvedOptions, SpeakOptions, Voice};

// Set to true to log every narration request
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationStatus {
    pub speaking: bool,
    pub utterance_id: Option<u64>,
    pub text: Option<String>,
}

/// Progress callbacks handed to the synthesizer with each utterance.
#[derive(Clone)]
pub struct UtteranceEvents {
    id: u64,
    inner: Weak<NarrationInner>,
}

impl UtteranceEvents {
    pub fn utterance_id(&self) -> u64 {
        self.id
    }

    pub fn started(&self) {
        self.update(true);
    }

    pub fn ended(&self) {
        self.update(false);
    }

    pub fn failed(&self, reason: &str) {
        log_warn!("utterance {} failed: {reason}", self.id);
        self.update(false);
    }

    fn update(&self, speaking: bool) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        inner.status.send_if_modified(|status| {
            if status.utterance_id != Some(self.id) || status.speaking == speaking {
                return false;
            }
            status.speaking = speaking;
            true
        });
    }
}

struct ActiveSequence {
    id: u64,
    token: CancellationToken,
}

struct NarrationInner {
    synth: Capability<dyn SpeechSynthesizer>,
    views: Capability<dyn ViewTextSource>,
    defaults: RwLock<NarrationSettings>,
    sequence: Mutex<Option<ActiveSequence>>,
    status: watch::Sender<NarrationStatus>,
    next_utterance: AtomicU64,
    next_sequence: AtomicU64,
}

/// Owned narration service; clones share the same active-utterance slot.
#[derive(Clone)]
pub struct NarrationService {
    inner: Arc<NarrationInner>,
}

impl NarrationService {
    pub fn new(
        synth: Capability<dyn SpeechSynthesizer>,
        views: Capability<dyn ViewTextSource>,
        defaults: NarrationSettings,
    ) -> Self {
        let (status, _) = watch::channel(NarrationStatus::default());
        Self {
            inner: Arc::new(NarrationInner {
                synth,
                views,
                defaults: RwLock::new(defaults),
                sequence: Mutex::new(None),
                status,
                next_utterance: AtomicU64::new(0),
                next_sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Narration with every capability missing; all calls are no-ops.
    pub fn disabled() -> Self {
        Self::new(
            Capability::Unavailable,
            Capability::Unavailable,
            NarrationSettings::default(),
        )
    }

    /// Whether speech output exists at all; callers hide voice-only affordances otherwise.
    pub fn is_supported(&self) -> bool {
        self.inner.synth.is_available()
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.status.borrow().speaking
    }

    pub fn status(&self) -> NarrationStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NarrationStatus> {
        self.inner.status.subscribe()
    }

    pub fn set_defaults(&self, defaults: NarrationSettings) {
        let mut guard = self
            .inner
            .defaults
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = defaults;
    }

    pub fn speak(&self, text: &str) -> Option<u64> {
        self.speak_with(text, &SpeakOptions::default())
    }

    /// Cancels the current utterance and any running sequence, then speaks `text`.
    /// Returns the new utterance id, or `None` when nothing was spoken.
    pub fn speak_with(&self, text: &str, options: &SpeakOptions) -> Option<u64> {
        self.utter(text, options, None)
    }

    pub fn stop(&self) {
        // Same lock as `utter`, so a concurrent speak lands wholly before or after.
        let mut slot = self.lock_sequence();
        if let Some(active) = slot.take() {
            active.token.cancel();
        }
        if let Some(synth) = self.inner.synth.get() {
            synth.cancel();
        }
        self.inner.status.send_if_modified(|status| {
            let changed = status.speaking || status.utterance_id.is_some();
            status.speaking = false;
            status.utterance_id = None;
            changed
        });
        drop(slot);
    }

    /// Reads the visible text of `region` (default: the primary content region).
    pub fn read_current_view(&self, region: Option<&str>) -> Option<u64> {
        let views = self.inner.views.get()?;
        let region = region.unwrap_or(PRIMARY_REGION);
        let raw = views
            .visible_text(region)
            .or_else(|| views.visible_text(WHOLE_VIEW))?;
        self.speak(&speakable(&raw))
    }

    /// Speaks item `i` at `i * interval`. Must be called inside a tokio runtime.
    pub fn narrate_sequence(
        &self,
        items: Vec<String>,
        interval: Duration,
    ) -> Option<NarrationSequence> {
        let items: Vec<String> = items
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .collect();
        if !self.is_supported() || items.is_empty() {
            return None;
        }

        let token = CancellationToken::new();
        let sequence_id = self.inner.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.lock_sequence();
            if let Some(previous) = slot.replace(ActiveSequence {
                id: sequence_id,
                token: token.clone(),
            }) {
                previous.token.cancel();
            }
        }

        let len = items.len();
        let service = self.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    tokio::select! {
                        _ = time::sleep(interval) => {}
                        _ = task_token.cancelled() => return,
                    }
                }
                if service
                    .utter(item, &SpeakOptions::default(), Some(&task_token))
                    .is_none()
                {
                    return;
                }
            }
            service.release_sequence(sequence_id);
        });

        Some(NarrationSequence::new(token, handle, len))
    }

    fn utter(
        &self,
        text: &str,
        options: &SpeakOptions,
        sequence: Option<&CancellationToken>,
    ) -> Option<u64> {
        let synth = self.inner.synth.get()?;
        if text.trim().is_empty() {
            return None;
        }

        // Held across cancel+speak so a sequence step can never land after a
        // newer direct request.
        let mut slot = self.lock_sequence();
        match sequence {
            Some(token) if token.is_cancelled() => return None,
            Some(_) => {}
            None => {
                if let Some(active) = slot.take() {
                    active.token.cancel();
                }
            }
        }

        synth.cancel();

        let resolved = {
            let defaults = self
                .inner
                .defaults
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            ResolvedOptions::resolve(options, &defaults)
        };
        let id = self.inner.next_utterance.fetch_add(1, Ordering::SeqCst) + 1;
        let utterance = Utterance {
            id,
            text: text.to_string(),
            voice: choose_voice(&synth.voices(), &resolved.lang),
            rate: resolved.rate,
            pitch: resolved.pitch,
            volume: resolved.volume,
            lang: resolved.lang,
        };

        self.inner.status.send_replace(NarrationStatus {
            speaking: false,
            utterance_id: Some(id),
            text: Some(utterance.text.clone()),
        });

        log_debug!("narrating utterance {id}: {text}");
        synth.speak(
            utterance,
            UtteranceEvents {
                id,
                inner: Arc::downgrade(&self.inner),
            },
        );
        drop(slot);

        Some(id)
    }

    fn release_sequence(&self, sequence_id: u64) {
        let mut slot = self.lock_sequence();
        if slot.as_ref().map(|active| active.id) == Some(sequence_id) {
            slot.take();
        }
    }

    fn lock_sequence(&self) -> MutexGuard<'_, Option<ActiveSequence>> {
        self.inner
            .sequence
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
