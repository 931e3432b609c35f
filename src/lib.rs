//! Speech playback core for the contextual page Q&A sidebar.
//!
//! The sidebar asks a question about the current page and reads the answer
//! aloud. This crate holds the parts with real logic in them:
//! - slider <-> speech parameter mapping
//! - the voice registry and its default-voice policy
//! - the playback controller state machine
//! - persisted TTS settings, app options and the Q&A history

pub mod history;
pub mod integration;
pub mod settings;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ContextualError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Voice unresolved: {0}")]
    VoiceUnresolved(String),

    #[error("Synthesis failure: {0}")]
    SynthesisFailure(String),

    #[error("Speech engine error: {0}")]
    EngineError(String),

    #[error("Settings storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ContextualError {
    fn from(e: std::io::Error) -> Self {
        ContextualError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for ContextualError {
    fn from(e: serde_json::Error) -> Self {
        ContextualError::SerializationError(e.to_string())
    }
}

impl ContextualError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Caller passed something out of range; clamping recovers
            ContextualError::InvalidParameter(_) => true,
            // Engine default voice is used instead
            ContextualError::VoiceUnresolved(_) => true,
            // Local to one utterance, controller is back in Idle
            ContextualError::SynthesisFailure(_) => true,
            ContextualError::EngineError(_) => true,
            ContextualError::StorageError(_) => true,
            ContextualError::SerializationError(_) => true,
            ContextualError::ConfigError(_) => false,
            ContextualError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ContextualError::InvalidParameter(_) => {
                "A speech setting was out of range and has been adjusted.".to_string()
            }
            ContextualError::VoiceUnresolved(_) => {
                "The selected voice is no longer available. Using the default voice.".to_string()
            }
            ContextualError::SynthesisFailure(_) => {
                "Text-to-speech failed. Please try again.".to_string()
            }
            ContextualError::EngineError(_) => {
                "The speech engine is unavailable.".to_string()
            }
            ContextualError::StorageError(_) => {
                "Error saving settings. Please try again.".to_string()
            }
            ContextualError::SerializationError(_) => {
                "Stored settings could not be read.".to_string()
            }
            ContextualError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ContextualError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContextualError>;
