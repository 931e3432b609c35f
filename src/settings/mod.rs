//! Settings persistence
//!
//! - [`store`]: the key-value backend trait and two implementations
//! - [`tts`]: text-to-speech settings stored on top of it

pub mod store;
pub mod tts;

pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use tts::{TtsSettings, TtsSettingsUpdate};
