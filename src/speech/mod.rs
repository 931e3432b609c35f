//! Text-to-speech core
//!
//! This module provides:
//! - Slider <-> parameter mapping ([`units`])
//! - The voice registry and default-voice policy ([`voices`])
//! - The host engine interface ([`engine`]) and a simulated engine ([`simulated`])
//! - The playback controller state machine ([`playback`])

pub mod engine;
pub mod playback;
pub mod simulated;
pub mod units;
pub mod voices;

// Re-export commonly used types
pub use engine::{EngineEvent, SpeechEngine, Utterance};
pub use playback::{PlaybackController, PlaybackSession, PlaybackState};
pub use simulated::{SimulatedConfig, SimulatedEngine};
pub use units::SliderKind;
pub use voices::{
    select_default_voice, VoiceDescriptor, VoiceLoadOutcome, VoiceRegistry,
    DEFAULT_VOICE_LOAD_TIMEOUT,
};
