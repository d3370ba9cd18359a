use serde::{Deserialize, Serialize};

use crate::settings::NarrationSettings;

const RATE_RANGE: (f32, f32) = (0.1, 10.0);
const PITCH_RANGE: (f32, f32) = (0.0, 2.0);
const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

const QUALITY_MARKERS: [&str; 2] = ["Enhanced", "Premium"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub name: String,
    /// BCP-47 tag as reported by the platform, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn speaks(&self, lang: &str) -> bool {
        self.lang.starts_with(lang)
    }

    fn is_high_quality(&self) -> bool {
        QUALITY_MARKERS
            .iter()
            .any(|marker| self.name.contains(marker))
    }
}

/// Per-request overrides; anything left `None` falls back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakOptions {
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub lang: Option<String>,
}

impl SpeakOptions {
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl ResolvedOptions {
    pub fn resolve(options: &SpeakOptions, defaults: &NarrationSettings) -> Self {
        Self {
            rate: pick(options.rate, defaults.rate, RATE_RANGE),
            pitch: pick(options.pitch, defaults.pitch, PITCH_RANGE),
            volume: pick(options.volume, defaults.volume, VOLUME_RANGE),
            lang: options
                .lang
                .as_deref()
                .filter(|lang| !lang.trim().is_empty())
                .unwrap_or(&defaults.lang)
                .to_string(),
        }
    }
}

fn pick(requested: Option<f32>, fallback: f32, (min, max): (f32, f32)) -> f32 {
    let value = requested.filter(|v| v.is_finite()).unwrap_or(fallback);
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

/// Enhanced/premium voices for the language win over plain ones; `None` lets
/// the platform use its default voice.
pub fn choose_voice(voices: &[Voice], lang: &str) -> Option<Voice> {
    voices
        .iter()
        .find(|voice| voice.speaks(lang) && voice.is_high_quality())
        .or_else(|| voices.iter().find(|voice| voice.speaks(lang)))
        .cloned()
}
