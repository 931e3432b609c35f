//! Options page model
//!
//! The page shows sliders, not raw values. [`OptionsForm`] holds what the
//! page holds and converts to and from the persisted representation.

use crate::integration::config::{AppConfig, DEFAULT_BACKEND_URL};
use crate::settings::{SettingsStore, TtsSettings, TtsSettingsUpdate};
use crate::speech::engine::SpeechEngine;
use crate::speech::playback::PlaybackController;
use crate::speech::units::{self, SliderKind};
use crate::speech::voices::VoiceDescriptor;
use crate::Result;
use tracing::{info, warn};

/// Sentence spoken by the "test voice" button
pub const TEST_PHRASE: &str =
    "This is a test of the text-to-speech feature with the current settings.";

/// Option label for a voice, e.g. "Samantha (en-US)"
pub fn voice_label(voice: &VoiceDescriptor) -> String {
    format!("{} ({})", voice.display_name, voice.language_tag)
}

/// State of the options page controls
#[derive(Clone, Debug, PartialEq)]
pub struct OptionsForm {
    pub voice_id: String,
    pub speed_slider: i32,
    pub pitch_slider: i32,
    pub volume_slider: i32,
    pub api_key: String,
    pub backend_url: String,
    pub history_enabled: bool,
}

impl OptionsForm {
    /// Populate the controls from the current configuration and settings
    pub fn from_state(config: &AppConfig, settings: &TtsSettings) -> Self {
        Self {
            voice_id: settings.voice_id.clone(),
            speed_slider: units::slider_from_speed(settings.rate),
            pitch_slider: units::slider_from_pitch(settings.pitch),
            volume_slider: units::slider_from_volume(settings.volume),
            api_key: config.api_key.clone().unwrap_or_default(),
            backend_url: config.backend_url.clone(),
            history_enabled: config.history_enabled,
        }
    }

    /// TTS settings the sliders currently describe
    pub fn tts_update(&self) -> TtsSettingsUpdate {
        TtsSettingsUpdate::new()
            .with_voice(self.voice_id.clone())
            .with_rate(units::speed_from_slider(self.speed_slider))
            .with_pitch(units::pitch_from_slider(self.pitch_slider))
            .with_volume(units::volume_from_slider(self.volume_slider))
    }

    /// App configuration with the form's options applied over `base`
    pub fn app_config(&self, base: &AppConfig) -> AppConfig {
        let api_key = self.api_key.trim();
        let backend_url = self.backend_url.trim();

        let mut config = base.clone();
        config.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
        config.backend_url = if backend_url.is_empty() {
            DEFAULT_BACKEND_URL.to_string()
        } else {
            backend_url.to_string()
        };
        config.history_enabled = self.history_enabled;
        config
    }

    /// Labels shown next to the sliders: speed, pitch, volume
    pub fn value_labels(&self) -> [String; 3] {
        [
            units::display_value(SliderKind::Speed.to_value(self.speed_slider)),
            units::display_value(SliderKind::Pitch.to_value(self.pitch_slider)),
            units::display_value(SliderKind::Volume.to_value(self.volume_slider)),
        ]
    }

    /// Persist the form and hand the new TTS settings to the controller.
    ///
    /// Nothing is changed in memory if validation or the store write fails.
    /// A backend URL that is not http(s) is saved as entered with a warning.
    pub fn apply<E: SpeechEngine>(
        &self,
        store: &dyn SettingsStore,
        config: &mut AppConfig,
        controller: &mut PlaybackController<E>,
    ) -> Result<()> {
        let new_config = self.app_config(config);
        new_config.validate()?;
        if !new_config.has_valid_backend_url() {
            warn!("Backend URL {:?} is not http(s)", new_config.backend_url);
        }

        let update = self.tts_update();
        let mut settings = controller.settings().clone();
        settings.merge(&update);

        new_config.save(store)?;
        settings.save(store)?;

        controller.update_settings(&update);
        *config = new_config;

        info!("Options saved");
        Ok(())
    }
}
