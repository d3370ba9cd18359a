use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

const DATA_DIR_ENV: &str = "OPERATOR_ASSIST_DATA_DIR";
const APP_DIR_NAME: &str = "operator-assist";

/// Voice defaults tuned for noisy outdoor cabs: slower than normal speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NarrationSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
            lang: "en".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuideSettings {
    pub interval_ms: u64,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self { interval_ms: 3_000 }
    }
}

impl GuideSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncSettings {
    /// Base URL of the field backend; `None` keeps everything queued locally.
    pub endpoint: Option<String>,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            batch_size: 50,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureSettings {
    /// Max perceptual-hash distance at which two photos of one check count as the same shot.
    pub duplicate_threshold: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            duplicate_threshold: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationSettings {
    pub arrival_radius_m: f64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            arrival_radius_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertSettings {
    /// Pause before a newly raised alert is read out.
    pub announce_delay_ms: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            announce_delay_ms: 500,
        }
    }
}

impl AlertSettings {
    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UserSettings {
    narration: NarrationSettings,
    guide: GuideSettings,
    sync: SyncSettings,
    capture: CaptureSettings,
    navigation: NavigationSettings,
    alerts: AlertSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn narration(&self) -> NarrationSettings {
        self.read().narration.clone()
    }

    pub fn guide(&self) -> GuideSettings {
        self.read().guide.clone()
    }

    pub fn sync(&self) -> SyncSettings {
        self.read().sync.clone()
    }

    pub fn capture(&self) -> CaptureSettings {
        self.read().capture.clone()
    }

    pub fn navigation(&self) -> NavigationSettings {
        self.read().navigation.clone()
    }

    pub fn alerts(&self) -> AlertSettings {
        self.read().alerts.clone()
    }

    pub fn update_narration(&self, settings: NarrationSettings) -> Result<()> {
        let mut guard = self.write();
        guard.narration = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// `$OPERATOR_ASSIST_DATA_DIR`, else the platform data directory.
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs_next::data_dir()
        .map(|base| base.join(APP_DIR_NAME))
        .with_context(|| format!("no platform data directory; set {DATA_DIR_ENV}"))
}
