//! Voice registry
//!
//! Hosts often populate their voice list lazily, so the first query can come
//! back empty. [`VoiceRegistry::load`] waits for a "voices changed" signal or
//! a timeout, whichever comes first, and accepts whatever is there by then.

use crate::speech::engine::SpeechEngine;
use crate::{ContextualError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// How long to wait for a late voice list
pub const DEFAULT_VOICE_LOAD_TIMEOUT: Duration = Duration::from_secs(1);

/// A selectable synthetic voice, as reported by the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Opaque identifier, unique within one registry snapshot
    pub voice_id: String,

    /// Human readable name
    pub display_name: String,

    /// BCP-47 language tag, e.g. "en-US"
    pub language_tag: String,
}

impl VoiceDescriptor {
    pub fn new(
        voice_id: impl Into<String>,
        display_name: impl Into<String>,
        language_tag: impl Into<String>,
    ) -> Self {
        Self {
            voice_id: voice_id.into(),
            display_name: display_name.into(),
            language_tag: language_tag.into(),
        }
    }
}

/// How a voice load finished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceLoadOutcome {
    /// The first query already returned voices
    Immediate,

    /// The host signalled a change before the timeout
    Changed,

    /// The timeout elapsed first; the list may still be empty
    TimedOut,

    /// The engine dropped its change notifier, no late list will come
    Closed,
}

/// Snapshot of the voices the host offers
#[derive(Clone, Debug, Default)]
pub struct VoiceRegistry {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceRegistry {
    pub fn new(voices: Vec<VoiceDescriptor>) -> Self {
        Self { voices }
    }

    /// Query the engine, waiting up to `timeout` for a late population
    pub async fn load<E: SpeechEngine + ?Sized>(
        engine: &E,
        timeout: Duration,
    ) -> (Self, VoiceLoadOutcome) {
        // Subscribe before the first query so a change that lands in between
        // is not lost.
        let mut changed = engine.voices_changed();

        let voices = engine.list_voices();
        if !voices.is_empty() {
            debug!("{} voices available immediately", voices.len());
            return (Self::new(voices), VoiceLoadOutcome::Immediate);
        }

        debug!("Voice list empty, waiting up to {:?}", timeout);

        let outcome = match tokio::time::timeout(timeout, changed.recv()).await {
            Ok(Ok(())) | Ok(Err(RecvError::Lagged(_))) => VoiceLoadOutcome::Changed,
            Ok(Err(RecvError::Closed)) => VoiceLoadOutcome::Closed,
            Err(_) => VoiceLoadOutcome::TimedOut,
        };

        let voices = engine.list_voices();
        match outcome {
            VoiceLoadOutcome::TimedOut if voices.is_empty() => {
                warn!("No voices after {:?}, continuing without a voice list", timeout);
            }
            VoiceLoadOutcome::Closed => {
                warn!("Engine stopped voice notifications, using {} voices", voices.len());
            }
            _ => info!("Loaded {} voices ({:?})", voices.len(), outcome),
        }

        (Self::new(voices), outcome)
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Look up a voice by id
    pub fn resolve(&self, voice_id: &str) -> Result<&VoiceDescriptor> {
        self.voices
            .iter()
            .find(|v| v.voice_id == voice_id)
            .ok_or_else(|| {
                ContextualError::VoiceUnresolved(format!("'{}' not offered by the engine", voice_id))
            })
    }

    /// Default voice for this registry, see [`select_default_voice`]
    pub fn default_voice(&self, preferred_language: &str) -> String {
        select_default_voice(&self.voices, preferred_language)
    }
}

/// Pick a voice when none is configured: exact language tag match first,
/// then the first listed voice, else an empty id.
pub fn select_default_voice(voices: &[VoiceDescriptor], preferred_language: &str) -> String {
    voices
        .iter()
        .find(|v| v.language_tag == preferred_language)
        .or_else(|| voices.first())
        .map(|v| v.voice_id.clone())
        .unwrap_or_default()
}
