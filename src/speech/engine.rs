//! Host speech engine interface
//!
//! The controller never talks to a concrete synthesizer. The host (a browser
//! bridge, a platform TTS binding, or [`SimulatedEngine`]) implements
//! [`SpeechEngine`] and is injected at construction.
//!
//! [`SimulatedEngine`]: crate::speech::simulated::SimulatedEngine

use crate::speech::voices::VoiceDescriptor;
use crate::Result;
use crossbeam_channel::Receiver;
use tokio::sync::broadcast;
use uuid::Uuid;

/// One synthesis request, with the parameters fixed at `play` time
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    /// Identifies the session this utterance belongs to
    pub id: Uuid,

    /// Text to speak
    pub text: String,

    /// Registry voice to use; `None` lets the engine pick its own default
    pub voice_id: Option<String>,

    /// Speech rate (0.1-10.0)
    pub rate: f64,

    /// Pitch (0.1-2.0)
    pub pitch: f64,

    /// Volume (0.1-1.0)
    pub volume: f64,
}

/// Event reported by the engine for a single utterance
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Audio output has begun
    Start,

    /// The utterance finished normally
    End,

    /// Synthesis failed part way through
    Error(String),

    /// Output was paused
    Pause,

    /// Output was resumed
    Resume,
}

/// Speech synthesis backend used by the playback controller
///
/// Implementations are used serially: the controller cancels the previous
/// utterance before calling [`SpeechEngine::speak`] again.
pub trait SpeechEngine: Send + Sync {
    /// Voices currently offered by the host. May be empty while the host is
    /// still populating its list.
    fn list_voices(&self) -> Vec<VoiceDescriptor>;

    /// Subscribe to "voice list changed" notifications
    fn voices_changed(&self) -> broadcast::Receiver<()>;

    /// Start speaking. The returned receiver yields the utterance's events and
    /// disconnects once the utterance is over or cancelled.
    fn speak(&self, utterance: &Utterance) -> Result<Receiver<EngineEvent>>;

    /// Pause the current utterance
    fn pause(&self);

    /// Resume a paused utterance
    fn resume(&self);

    /// Silence and drop the current utterance
    fn cancel(&self);
}
