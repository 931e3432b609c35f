//! Sidebar session
//!
//! Wires the settings store, the voice registry, the playback controller and
//! the history together the way the sidebar and options page use them.

use crate::history::{HistoryItem, HistoryStorage, PageInfo};
use crate::integration::config::AppConfig;
use crate::integration::options::{OptionsForm, TEST_PHRASE};
use crate::settings::{SettingsStore, TtsSettings};
use crate::speech::engine::SpeechEngine;
use crate::speech::playback::{PlaybackController, PlaybackState};
use crate::speech::voices::{VoiceLoadOutcome, VoiceRegistry};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SidebarSession<E: SpeechEngine> {
    config: AppConfig,
    store: Arc<dyn SettingsStore>,
    controller: PlaybackController<E>,
    history: HistoryStorage,
}

impl<E: SpeechEngine> SidebarSession<E> {
    /// Load options, voices and TTS settings.
    ///
    /// When no voice is configured yet, the default voice for
    /// `config.preferred_language` is chosen and persisted.
    pub async fn initialize(
        engine: Arc<E>,
        store: Arc<dyn SettingsStore>,
        config: AppConfig,
    ) -> Result<Self> {
        let config = config.load(&*store)?;
        config.validate()?;

        let (registry, outcome) =
            VoiceRegistry::load(&*engine, config.voice_load_timeout).await;
        debug!("Voice load finished: {:?}", outcome);

        let mut settings = TtsSettings::load(&*store)?;
        if !settings.has_voice() && !registry.is_empty() {
            settings.voice_id = registry.default_voice(&config.preferred_language);
            info!(
                "No voice configured, defaulting to '{}' for {}",
                settings.voice_id, config.preferred_language
            );
            settings.save_voice(&*store)?;
        }

        let history = HistoryStorage::with_limit(Arc::clone(&store), config.history_limit);
        let controller = PlaybackController::new(engine, registry, settings);

        Ok(Self {
            config,
            store,
            controller,
            history,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> &PlaybackController<E> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<E> {
        &mut self.controller
    }

    pub fn history(&self) -> &HistoryStorage {
        &self.history
    }

    /// Re-query the engine's voices, e.g. after the host reports a change
    pub async fn refresh_voices(&mut self) -> VoiceLoadOutcome {
        let timeout = self.config.voice_load_timeout;
        let (registry, outcome) = VoiceRegistry::load(&**self.controller.engine(), timeout).await;
        self.controller.set_registry(registry);
        outcome
    }

    /// Record an answered question. Returns whether it was stored.
    pub fn record_answer(&self, question: &str, answer: &str, page: &PageInfo) -> Result<bool> {
        if !self.config.history_enabled {
            debug!("History disabled, not recording");
            return Ok(false);
        }
        self.history.add(HistoryItem::new(question, answer, page))?;
        Ok(true)
    }

    /// Read an answer aloud
    pub fn speak_answer(&mut self, answer: &str) -> Result<()> {
        self.controller.play(answer)
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn resume(&mut self) {
        self.controller.resume();
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Process engine events; see [`PlaybackController::poll_events`]
    pub fn poll(&mut self) -> Result<PlaybackState> {
        self.controller.poll_events()?;
        Ok(self.controller.state())
    }

    /// Current state of the options page
    pub fn options_form(&self) -> OptionsForm {
        OptionsForm::from_state(&self.config, self.controller.settings())
    }

    /// Save the options page
    pub fn apply_options(&mut self, form: &OptionsForm) -> Result<()> {
        form.apply(&*self.store, &mut self.config, &mut self.controller)
    }

    /// Speak the preview sentence with the form's (unsaved) settings
    pub fn test_voice(&mut self, form: &OptionsForm) -> Result<()> {
        self.controller.update_settings(&form.tts_update());
        self.controller.play(TEST_PHRASE)
    }
}
