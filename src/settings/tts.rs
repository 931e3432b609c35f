//! Persisted text-to-speech settings

use crate::settings::store::SettingsStore;
use crate::speech::units::{MAX_PITCH, MAX_RATE, MAX_VOLUME, MIN_PITCH, MIN_RATE, MIN_VOLUME};
use crate::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

pub const KEY_VOICE: &str = "ttsVoiceURI";
pub const KEY_RATE: &str = "ttsRate";
pub const KEY_PITCH: &str = "ttsPitch";
pub const KEY_VOLUME: &str = "ttsVolume";

/// Voice and prosody used for the next utterance
#[derive(Clone, Debug, PartialEq)]
pub struct TtsSettings {
    /// Registry voice id; empty means "not configured"
    pub voice_id: String,
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Partial update for [`TtsSettings`]; `None` fields are left untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TtsSettingsUpdate {
    pub voice_id: Option<String>,
    pub rate: Option<f64>,
    pub pitch: Option<f64>,
    pub volume: Option<f64>,
}

impl TtsSettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.voice_id.is_none() && self.rate.is_none() && self.pitch.is_none() && self.volume.is_none()
    }
}

fn clamp_param(name: &str, value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        warn!("{} {} is not a number, using {}", name, value, fallback);
        return fallback;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} {} out of range, clamped to {}", name, value, clamped);
    }
    clamped
}

impl TtsSettings {
    /// Merge a partial update, clamping each value into its valid range
    pub fn merge(&mut self, update: &TtsSettingsUpdate) {
        if let Some(voice_id) = &update.voice_id {
            self.voice_id = voice_id.clone();
        }
        if let Some(rate) = update.rate {
            self.rate = clamp_param("rate", rate, MIN_RATE, MAX_RATE, self.rate);
        }
        if let Some(pitch) = update.pitch {
            self.pitch = clamp_param("pitch", pitch, MIN_PITCH, MAX_PITCH, self.pitch);
        }
        if let Some(volume) = update.volume {
            self.volume = clamp_param("volume", volume, MIN_VOLUME, MAX_VOLUME, self.volume);
        }
    }

    /// Whether a voice has been chosen
    pub fn has_voice(&self) -> bool {
        !self.voice_id.is_empty()
    }

    /// Load from the store. Missing, zero or non-numeric values fall back to
    /// the defaults; numbers are clamped into range.
    pub fn load(store: &dyn SettingsStore) -> Result<Self> {
        let stored = store.get(&[KEY_VOICE, KEY_RATE, KEY_PITCH, KEY_VOLUME])?;
        let defaults = Self::default();

        let number = |key: &str, default: f64| match stored.get(key).and_then(Value::as_f64) {
            Some(v) if v != 0.0 => v,
            _ => default,
        };

        let mut settings = Self::default();
        settings.merge(&TtsSettingsUpdate {
            voice_id: stored
                .get(KEY_VOICE)
                .and_then(Value::as_str)
                .map(str::to_string),
            rate: Some(number(KEY_RATE, defaults.rate)),
            pitch: Some(number(KEY_PITCH, defaults.pitch)),
            volume: Some(number(KEY_VOLUME, defaults.volume)),
        });

        debug!(
            "Loaded TTS settings: voice='{}' rate={} pitch={} volume={}",
            settings.voice_id, settings.rate, settings.pitch, settings.volume
        );
        Ok(settings)
    }

    /// Persist every field
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set(self.to_entries())
    }

    /// Persist only the voice id
    pub fn save_voice(&self, store: &dyn SettingsStore) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(KEY_VOICE.to_string(), json!(self.voice_id));
        store.set(entries)
    }

    pub fn to_entries(&self) -> Map<String, Value> {
        let mut entries = Map::new();
        entries.insert(KEY_VOICE.to_string(), json!(self.voice_id));
        entries.insert(KEY_RATE.to_string(), json!(self.rate));
        entries.insert(KEY_PITCH.to_string(), json!(self.pitch));
        entries.insert(KEY_VOLUME.to_string(), json!(self.volume));
        entries
    }
}
