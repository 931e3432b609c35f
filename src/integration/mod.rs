//! Integration module for the sidebar
//!
//! Provides configuration, the options page model and the session that ties
//! the speech core to the settings store and history.

pub mod config;
pub mod options;
pub mod session;

pub use config::{language_tag_from_locale, AppConfig, DEFAULT_BACKEND_URL};
pub use options::{voice_label, OptionsForm, TEST_PHRASE};
pub use session::SidebarSession;
