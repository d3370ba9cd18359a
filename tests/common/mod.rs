#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tokio::sync::mpsc;

use operator_assist_lib::{
    capabilities::Capability,
    capture::PhotoLog,
    checklist::{ChecklistEngine, Inspection, Section},
    db::{Database, OutboxEntry},
    narration::{
        NarrationService, SpeechSynthesizer, Utterance, UtteranceEvents, ViewSnapshots,
        ViewTextSource, Voice,
    },
    navigation::{Geolocation, PositionFix, PositionWatch},
    offline::{ConnectivityState, OfflineStore, SyncTransport},
    settings::NarrationSettings,
};

/// Synthesizer that "plays" instantly and remembers what it was asked to say.
#[derive(Default)]
pub struct RecordingSynth {
    spoken: Mutex<Vec<Utterance>>,
    events: Mutex<Vec<UtteranceEvents>>,
    cancels: AtomicUsize,
}

impl RecordingSynth {
    pub fn texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|utterance| utterance.text.clone())
            .collect()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.texts().last().cloned()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Reports the most recent utterance as finished.
    pub fn finish_current(&self) {
        if let Some(events) = self.events.lock().unwrap().last() {
            events.ended();
        }
    }

    /// Reports the `index`-th utterance ever spoken as finished.
    pub fn finish_nth(&self, index: usize) {
        let events = self.events.lock().unwrap()[index].clone();
        events.ended();
    }
}

impl SpeechSynthesizer for RecordingSynth {
    fn voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("Samantha", "en-US"),
            Voice::new("Samantha (Enhanced)", "en-US"),
            Voice::new("Lekha", "hi-IN"),
        ]
    }

    fn speak(&self, utterance: Utterance, events: UtteranceEvents) {
        events.started();
        self.spoken.lock().unwrap().push(utterance);
        self.events.lock().unwrap().push(events);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn narration_with(synth: &Arc<RecordingSynth>, views: Option<Arc<ViewSnapshots>>) -> NarrationService {
    let views = match views {
        Some(views) => Capability::Available(views as Arc<dyn ViewTextSource>),
        None => Capability::Unavailable,
    };
    NarrationService::new(
        Capability::Available(synth.clone() as Arc<dyn SpeechSynthesizer>),
        views,
        NarrationSettings::default(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    AckAll,
    AckFirst(usize),
    Fail,
}

/// Transport double counting calls and optionally refusing or partially acknowledging batches.
pub struct CountingTransport {
    mode: Mutex<TransportMode>,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<OutboxEntry>>>,
}

impl CountingTransport {
    pub fn new(mode: TransportMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: TransportMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<OutboxEntry>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTransport for CountingTransport {
    async fn deliver(&self, batch: &[OutboxEntry]) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(batch.to_vec());

        let mode = *self.mode.lock().unwrap();
        match mode {
            TransportMode::AckAll => Ok(batch.iter().map(|entry| entry.id.clone()).collect()),
            TransportMode::AckFirst(n) => Ok(batch.iter().take(n).map(|entry| entry.id.clone()).collect()),
            TransportMode::Fail => Err(anyhow!("backend unreachable")),
        }
    }
}

/// Geolocation double: tests push fixes through the sender of the latest watch.
#[derive(Default)]
pub struct FakeGeolocation {
    next_id: AtomicU64,
    senders: Mutex<Vec<(u64, mpsc::Sender<PositionFix>)>>,
    cleared: Mutex<Vec<u64>>,
    refuse: bool,
}

impl FakeGeolocation {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub async fn push(&self, fix: PositionFix) {
        let sender = self
            .senders
            .lock()
            .unwrap()
            .last()
            .map(|(_, sender)| sender.clone())
            .expect("no active watch");
        sender.send(fix).await.expect("watch receiver dropped");
    }

    pub fn watches_opened(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    pub fn cleared(&self) -> Vec<u64> {
        self.cleared.lock().unwrap().clone()
    }
}

impl Geolocation for FakeGeolocation {
    fn watch_position(&self) -> Result<PositionWatch> {
        if self.refuse {
            return Err(anyhow!("permission denied"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::channel(16);
        self.senders.lock().unwrap().push((id, tx));
        Ok(PositionWatch { id, fixes: rx })
    }

    fn clear_watch(&self, watch_id: u64) {
        self.cleared.lock().unwrap().push(watch_id);
    }
}

pub fn temp_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("test.sqlite3")).unwrap();
    (dir, db)
}

pub fn store_with(db: &Database, transport: Arc<CountingTransport>, state: ConnectivityState) -> OfflineStore {
    OfflineStore::new(db.clone(), transport, state, 50)
}

pub fn small_inspection() -> Inspection {
    Inspection::new(
        "insp-test",
        vec![
            Section::new("tires", "Tires")
                .check("tire-pressure", "Tire pressure")
                .check("tire-tread", "Tread depth"),
            Section::new("hydraulics", "Hydraulics").check("hyd-leaks", "Hydraulic leaks"),
        ],
    )
}

pub struct ChecklistFixture {
    pub _dir: TempDir,
    pub db: Database,
    pub synth: Arc<RecordingSynth>,
    pub transport: Arc<CountingTransport>,
    pub store: OfflineStore,
    pub narration: NarrationService,
    pub engine: ChecklistEngine,
}

pub fn checklist_fixture(inspection: Inspection) -> ChecklistFixture {
    let (dir, db) = temp_database();
    let synth = Arc::new(RecordingSynth::default());
    let transport = CountingTransport::new(TransportMode::AckAll);
    let store = store_with(&db, transport.clone(), ConnectivityState::Offline);
    let narration = narration_with(&synth, None);
    let photos = PhotoLog::new(db.clone(), narration.clone(), 8);
    let engine = ChecklistEngine::new(
        inspection,
        store.clone(),
        narration.clone(),
        photos,
        Duration::from_secs(3),
    );

    ChecklistFixture {
        _dir: dir,
        db,
        synth,
        transport,
        store,
        narration,
        engine,
    }
}

/// A small PNG; `seed` changes the content.
pub fn png_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 7 + y * 3) as u8).wrapping_mul(seed.wrapping_add(1));
        Rgb([v, v.wrapping_add(seed), 255 - v])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
