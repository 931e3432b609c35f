//! Playback controller
//!
//! State machine over a single utterance:
//!
//! ```text
//! Idle --play--> Speaking --pause--> Paused --resume--> Speaking
//! Speaking/Paused --stop--> Idle
//! Speaking/Paused --play--> Speaking (previous utterance cancelled)
//! ```
//!
//! At most one session exists at a time. `play` never queues: it cancels the
//! active utterance first. State changes are visible as soon as the call
//! returns, even if the host takes a moment to go quiet.
//!
//! Settings changes only apply to the next `play`. Engines generally cannot
//! retune an utterance that is already being spoken.

use crate::settings::tts::{TtsSettings, TtsSettingsUpdate};
use crate::speech::engine::{EngineEvent, SpeechEngine, Utterance};
use crate::speech::voices::VoiceRegistry;
use crate::{ContextualError, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where the controller is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

/// The utterance currently owned by the controller
#[derive(Clone, Debug)]
pub struct PlaybackSession {
    pub id: Uuid,
    pub text: String,

    /// Settings captured when the session started
    pub settings: TtsSettings,

    /// Voice actually sent to the engine (`None` = engine default)
    pub voice_id: Option<String>,

    pub state: PlaybackState,
}

pub struct PlaybackController<E: SpeechEngine> {
    engine: Arc<E>,
    registry: VoiceRegistry,
    settings: TtsSettings,
    session: Option<PlaybackSession>,
    events: Option<Receiver<EngineEvent>>,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: Arc<E>, registry: VoiceRegistry, settings: TtsSettings) -> Self {
        Self {
            engine,
            registry,
            settings,
            session: None,
            events: None,
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    /// Replace the voice snapshot, e.g. after the host reports new voices
    pub fn set_registry(&mut self, registry: VoiceRegistry) {
        self.registry = registry;
    }

    /// Settings that the next `play` will use
    pub fn settings(&self) -> &TtsSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(PlaybackState::Idle)
    }

    /// True while speaking or paused
    pub fn is_active(&self) -> bool {
        matches!(self.state(), PlaybackState::Speaking | PlaybackState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    /// Speak `text` with the current settings, replacing any active session
    pub fn play(&mut self, text: &str) -> Result<()> {
        if self.is_active() {
            debug!("Cancelling active session before starting a new one");
            self.clear_session();
        }

        let voice_id = self.resolve_voice();
        let utterance = Utterance {
            id: Uuid::new_v4(),
            text: text.to_string(),
            voice_id: voice_id.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        };

        let events = self.engine.speak(&utterance).map_err(|e| {
            warn!("Engine refused utterance: {}", e);
            e
        })?;

        info!(
            "Speaking {} chars (voice={:?} rate={} pitch={} volume={})",
            text.len(),
            voice_id,
            utterance.rate,
            utterance.pitch,
            utterance.volume
        );

        self.session = Some(PlaybackSession {
            id: utterance.id,
            text: utterance.text,
            settings: self.settings.clone(),
            voice_id,
            state: PlaybackState::Speaking,
        });
        self.events = Some(events);
        Ok(())
    }

    /// Pause output. Only meaningful while speaking.
    pub fn pause(&mut self) {
        if self.state() != PlaybackState::Speaking {
            debug!("pause ignored in {:?}", self.state());
            return;
        }

        self.engine.pause();
        if let Some(session) = self.session.as_mut() {
            session.state = PlaybackState::Paused;
            debug!("Paused session {}", session.id);
        }
    }

    /// Resume output. Only meaningful while paused.
    pub fn resume(&mut self) {
        if self.state() != PlaybackState::Paused {
            debug!("resume ignored in {:?}", self.state());
            return;
        }

        self.engine.resume();
        if let Some(session) = self.session.as_mut() {
            session.state = PlaybackState::Speaking;
            debug!("Resumed session {}", session.id);
        }
    }

    /// Stop output and return to idle from any state
    pub fn stop(&mut self) {
        self.clear_session();
    }

    /// Merge new settings. An in-flight utterance keeps the parameters it
    /// started with.
    pub fn update_settings(&mut self, update: &TtsSettingsUpdate) {
        self.settings.merge(update);
        if self.is_active() {
            debug!("Settings updated; applies from the next play");
        }
    }

    /// Drain pending engine events for the active session.
    ///
    /// Returns `SynthesisFailure` if the engine reported an error; the
    /// controller is back in `Idle` by then and can be used again.
    pub fn poll_events(&mut self) -> Result<()> {
        loop {
            let event = match self.events.as_ref() {
                Some(rx) => rx.try_recv(),
                None => return Ok(()),
            };

            match event {
                Ok(event) => self.handle_event(event)?,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    if self.is_active() {
                        debug!("Engine closed the event stream, treating as finished");
                    }
                    self.session = None;
                    self.events = None;
                    return Ok(());
                }
            }
        }
    }

    fn handle_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::Start => {
                debug!("Engine started speaking");
            }
            EngineEvent::Pause => {
                if let Some(session) = self.session.as_mut() {
                    session.state = PlaybackState::Paused;
                }
            }
            EngineEvent::Resume => {
                if let Some(session) = self.session.as_mut() {
                    session.state = PlaybackState::Speaking;
                }
            }
            EngineEvent::End => {
                if let Some(session) = self.session.take() {
                    info!("Finished session {}", session.id);
                }
                self.events = None;
            }
            EngineEvent::Error(message) => {
                self.session = None;
                self.events = None;
                warn!("Synthesis failed: {}", message);
                return Err(ContextualError::SynthesisFailure(message));
            }
        }
        Ok(())
    }

    fn resolve_voice(&self) -> Option<String> {
        if !self.settings.has_voice() {
            return None;
        }

        match self.registry.resolve(&self.settings.voice_id) {
            Ok(voice) => Some(voice.voice_id.clone()),
            Err(e) => {
                warn!("{}, using the engine default voice", e);
                None
            }
        }
    }

    fn clear_session(&mut self) {
        self.engine.cancel();
        // Dropping the receiver discards any late events from the old utterance
        self.events = None;
        if let Some(session) = self.session.take() {
            debug!("Stopped session {}", session.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::voices::VoiceDescriptor;
    use crossbeam_channel::{unbounded, Sender};
    use parking_lot::Mutex;
    use tokio::sync::broadcast;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Speak(Utterance),
        Pause,
        Resume,
        Cancel,
    }

    /// Engine double that records calls and lets the test push events
    struct MockEngine {
        calls: Mutex<Vec<Call>>,
        event_tx: Mutex<Option<Sender<EngineEvent>>>,
        refuse: bool,
        voices_tx: broadcast::Sender<()>,
    }

    impl MockEngine {
        fn new() -> Self {
            let (voices_tx, _) = broadcast::channel(4);
            Self {
                calls: Mutex::new(Vec::new()),
                event_tx: Mutex::new(None),
                refuse: false,
                voices_tx,
            }
        }

        fn refusing() -> Self {
            Self {
                refuse: true,
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn spoken(&self) -> Vec<Utterance> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Speak(u) => Some(u),
                    _ => None,
                })
                .collect()
        }

        fn emit(&self, event: EngineEvent) {
            if let Some(tx) = self.event_tx.lock().as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    impl SpeechEngine for MockEngine {
        fn list_voices(&self) -> Vec<VoiceDescriptor> {
            Vec::new()
        }

        fn voices_changed(&self) -> broadcast::Receiver<()> {
            self.voices_tx.subscribe()
        }

        fn speak(&self, utterance: &Utterance) -> Result<Receiver<EngineEvent>> {
            if self.refuse {
                return Err(ContextualError::EngineError("engine offline".into()));
            }
            self.calls.lock().push(Call::Speak(utterance.clone()));
            let (tx, rx) = unbounded();
            *self.event_tx.lock() = Some(tx);
            Ok(rx)
        }

        fn pause(&self) {
            self.calls.lock().push(Call::Pause);
        }

        fn resume(&self) {
            self.calls.lock().push(Call::Resume);
        }

        fn cancel(&self) {
            self.calls.lock().push(Call::Cancel);
        }
    }

    fn registry() -> VoiceRegistry {
        VoiceRegistry::new(vec![
            VoiceDescriptor::new("en-samantha", "Samantha", "en-US"),
            VoiceDescriptor::new("fr-amelie", "Amelie", "fr-FR"),
        ])
    }

    fn controller(engine: MockEngine) -> (PlaybackController<MockEngine>, Arc<MockEngine>) {
        let engine = Arc::new(engine);
        let ctrl = PlaybackController::new(Arc::clone(&engine), registry(), TtsSettings::default());
        (ctrl, engine)
    }

    #[test]
    fn test_starts_idle() {
        let (ctrl, _) = controller(MockEngine::new());
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert!(!ctrl.is_active());
        assert!(ctrl.session().is_none());
    }

    #[test]
    fn test_play_starts_speaking() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("hello").unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        assert!(ctrl.is_active());
        assert_eq!(ctrl.session().unwrap().text, "hello");
        assert_eq!(engine.spoken().len(), 1);
    }

    #[test]
    fn test_play_while_speaking_replaces_session() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("a").unwrap();
        let first_id = ctrl.session().unwrap().id;
        ctrl.play("b").unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        let session = ctrl.session().unwrap();
        assert_eq!(session.text, "b");
        assert_ne!(session.id, first_id);

        // Cancel lands between the two speak calls; nothing is queued
        let calls = engine.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[0], Call::Speak(u) if u.text == "a"));
        assert_eq!(calls[1], Call::Cancel);
        assert!(matches!(&calls[2], Call::Speak(u) if u.text == "b"));
    }

    #[test]
    fn test_play_while_paused_replaces_session() {
        let (mut ctrl, _) = controller(MockEngine::new());
        ctrl.play("a").unwrap();
        ctrl.pause();
        ctrl.play("b").unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        assert_eq!(ctrl.session().unwrap().text, "b");
    }

    #[test]
    fn test_pause_and_resume() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("text").unwrap();

        ctrl.pause();
        assert_eq!(ctrl.state(), PlaybackState::Paused);
        assert!(ctrl.is_active());
        assert!(ctrl.is_paused());

        ctrl.resume();
        assert_eq!(ctrl.state(), PlaybackState::Speaking);

        let calls = engine.calls();
        assert_eq!(calls[1], Call::Pause);
        assert_eq!(calls[2], Call::Resume);
    }

    #[test]
    fn test_pause_from_idle_is_noop() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.pause();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_resume_while_speaking_is_noop() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("text").unwrap();
        ctrl.resume();
        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        assert!(!engine.calls().contains(&Call::Resume));
    }

    #[test]
    fn test_double_pause_is_noop() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("text").unwrap();
        ctrl.pause();
        ctrl.pause();
        let pauses = engine.calls().iter().filter(|c| **c == Call::Pause).count();
        assert_eq!(pauses, 1);
    }

    #[test]
    fn test_stop_from_any_state() {
        let (mut ctrl, _) = controller(MockEngine::new());

        ctrl.stop();
        assert!(!ctrl.is_active());

        ctrl.play("one").unwrap();
        ctrl.stop();
        assert!(!ctrl.is_active());
        assert!(ctrl.session().is_none());

        ctrl.play("two").unwrap();
        ctrl.pause();
        ctrl.stop();
        assert!(!ctrl.is_active());
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_update_settings_applies_to_next_play_only() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("first").unwrap();

        ctrl.update_settings(&TtsSettingsUpdate::new().with_rate(2.0));
        assert_eq!(ctrl.session().unwrap().settings.rate, 1.0);
        assert_eq!(ctrl.settings().rate, 2.0);

        ctrl.play("second").unwrap();
        let spoken = engine.spoken();
        assert_eq!(spoken[0].rate, 1.0);
        assert_eq!(spoken[1].rate, 2.0);
        assert_eq!(ctrl.session().unwrap().settings.rate, 2.0);
    }

    #[test]
    fn test_configured_voice_is_resolved() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.update_settings(&TtsSettingsUpdate::new().with_voice("fr-amelie"));
        ctrl.play("bonjour").unwrap();
        assert_eq!(engine.spoken()[0].voice_id.as_deref(), Some("fr-amelie"));
    }

    #[test]
    fn test_unresolved_voice_falls_back_to_engine_default() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.update_settings(&TtsSettingsUpdate::new().with_voice("uninstalled"));
        ctrl.play("hello").unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        assert_eq!(engine.spoken()[0].voice_id, None);
        assert_eq!(ctrl.session().unwrap().voice_id, None);
    }

    #[test]
    fn test_end_event_returns_to_idle() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("short").unwrap();

        engine.emit(EngineEvent::Start);
        ctrl.poll_events().unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Speaking);

        engine.emit(EngineEvent::End);
        ctrl.poll_events().unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_synthesis_failure_surfaces_and_recovers() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("doomed").unwrap();

        engine.emit(EngineEvent::Error("audio device lost".into()));
        let err = ctrl.poll_events().unwrap_err();
        assert!(matches!(err, ContextualError::SynthesisFailure(ref m) if m == "audio device lost"));
        assert_eq!(ctrl.state(), PlaybackState::Idle);

        // No retry happened, and the controller still works
        assert_eq!(engine.spoken().len(), 1);
        ctrl.play("again").unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Speaking);
    }

    #[test]
    fn test_engine_pause_events_are_mirrored() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("text").unwrap();

        engine.emit(EngineEvent::Pause);
        ctrl.poll_events().unwrap();
        assert!(ctrl.is_paused());

        engine.emit(EngineEvent::Resume);
        ctrl.poll_events().unwrap();
        assert_eq!(ctrl.state(), PlaybackState::Speaking);
    }

    #[test]
    fn test_events_from_cancelled_utterance_are_ignored() {
        let (mut ctrl, engine) = controller(MockEngine::new());
        ctrl.play("old").unwrap();
        let stale = engine.event_tx.lock().clone().unwrap();

        ctrl.play("new").unwrap();
        let _ = stale.send(EngineEvent::End);
        ctrl.poll_events().unwrap();

        assert_eq!(ctrl.state(), PlaybackState::Speaking);
        assert_eq!(ctrl.session().unwrap().text, "new");
    }

    #[test]
    fn test_refused_speak_leaves_controller_idle() {
        let (mut ctrl, _) = controller(MockEngine::refusing());
        assert!(ctrl.play("nothing").is_err());
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }
}
