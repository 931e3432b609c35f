//! Host-independent speech engine
//!
//! Stands in for a real synthesizer: each utterance runs on a worker thread
//! that walks the text word by word at a pace scaled by the rate, honours
//! pause/resume/cancel, and reports through the usual event stream. No audio
//! is produced; the words are logged at debug level.

use crate::speech::engine::{EngineEvent, SpeechEngine, Utterance};
use crate::speech::voices::VoiceDescriptor;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Granularity at which the worker checks for pause/cancel
const TICK: Duration = Duration::from_millis(5);

/// Configuration for the simulated engine
#[derive(Clone, Debug)]
pub struct SimulatedConfig {
    /// Time to "speak" one word at rate 1.0
    pub word_duration: Duration,

    /// Report a synthesis failure after this many words
    pub fail_after_words: Option<usize>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            word_duration: Duration::from_millis(300),
            fail_after_words: None,
        }
    }
}

impl SimulatedConfig {
    /// Set the time per word at normal rate
    pub fn with_word_duration(mut self, duration: Duration) -> Self {
        self.word_duration = duration;
        self
    }

    /// Make every utterance fail after `words` words
    pub fn failing_after(mut self, words: usize) -> Self {
        self.fail_after_words = Some(words);
        self
    }
}

/// Control block shared with one utterance's worker thread
struct ActiveUtterance {
    id: Uuid,
    paused: AtomicBool,
    cancelled: AtomicBool,
    events: Sender<EngineEvent>,
}

pub struct SimulatedEngine {
    config: SimulatedConfig,
    voices: Mutex<Vec<VoiceDescriptor>>,
    voices_tx: broadcast::Sender<()>,
    active: Arc<Mutex<Option<Arc<ActiveUtterance>>>>,
}

impl SimulatedEngine {
    pub fn new(config: SimulatedConfig) -> Self {
        let (voices_tx, _) = broadcast::channel(8);
        Self {
            config,
            voices: Mutex::new(Vec::new()),
            voices_tx,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Engine that offers `voices` from the start
    pub fn with_voices(config: SimulatedConfig, voices: Vec<VoiceDescriptor>) -> Self {
        let engine = Self::new(config);
        *engine.voices.lock() = voices;
        engine
    }

    /// A small English/French voice set
    pub fn default_voices() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("sim-en-us", "Simulated Ava", "en-US"),
            VoiceDescriptor::new("sim-en-gb", "Simulated Oliver", "en-GB"),
            VoiceDescriptor::new("sim-fr-fr", "Simulated Chloe", "fr-FR"),
        ]
    }

    /// Replace the voice list and notify subscribers, like a host finishing
    /// its lazy voice enumeration
    pub fn publish_voices(&self, voices: Vec<VoiceDescriptor>) {
        *self.voices.lock() = voices;
        // No subscribers is fine
        let _ = self.voices_tx.send(());
    }

    /// Whether an utterance is currently running on a worker
    pub fn is_speaking(&self) -> bool {
        self.active.lock().is_some()
    }

    fn worker(config: SimulatedConfig, utterance: Utterance, control: Arc<ActiveUtterance>) {
        let words: Vec<String> = utterance.text.split_whitespace().map(str::to_string).collect();
        let per_word = config.word_duration.div_f64(utterance.rate.max(0.1));

        let _ = control.events.send(EngineEvent::Start);

        for (index, word) in words.iter().enumerate() {
            if config.fail_after_words == Some(index) {
                let _ = control.events.send(EngineEvent::Error(format!(
                    "simulated failure after {} words",
                    index
                )));
                return;
            }

            let mut remaining = per_word;
            while !remaining.is_zero() {
                if control.cancelled.load(Ordering::SeqCst) {
                    debug!("Utterance {} cancelled", control.id);
                    return;
                }
                if control.paused.load(Ordering::SeqCst) {
                    thread::sleep(TICK);
                    continue;
                }
                let step = remaining.min(TICK);
                thread::sleep(step);
                remaining -= step;
            }

            debug!("[{}] {}", control.id, word);
        }

        if control.cancelled.load(Ordering::SeqCst) {
            return;
        }
        let _ = control.events.send(EngineEvent::End);
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::with_voices(SimulatedConfig::default(), Self::default_voices())
    }
}

impl SpeechEngine for SimulatedEngine {
    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.lock().clone()
    }

    fn voices_changed(&self) -> broadcast::Receiver<()> {
        self.voices_tx.subscribe()
    }

    fn speak(&self, utterance: &Utterance) -> Result<Receiver<EngineEvent>> {
        let (events, rx) = unbounded();
        let control = Arc::new(ActiveUtterance {
            id: utterance.id,
            paused: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            events,
        });

        // Serial resource: a new utterance silences the previous one
        if let Some(previous) = self.active.lock().replace(Arc::clone(&control)) {
            previous.cancelled.store(true, Ordering::SeqCst);
        }

        info!(
            "Simulated speech {} (voice={:?} rate={:.2} pitch={:.2} volume={:.2})",
            utterance.id, utterance.voice_id, utterance.rate, utterance.pitch, utterance.volume
        );

        let config = self.config.clone();
        let utterance = utterance.clone();
        let active = Arc::clone(&self.active);
        thread::spawn(move || {
            let id = control.id;
            Self::worker(config, utterance, control);

            // Release the slot unless a newer utterance already took it
            let mut slot = active.lock();
            if slot.as_ref().map(|a| a.id) == Some(id) {
                *slot = None;
            }
        });

        Ok(rx)
    }

    fn pause(&self) {
        if let Some(active) = self.active.lock().as_ref() {
            if !active.paused.swap(true, Ordering::SeqCst) {
                let _ = active.events.send(EngineEvent::Pause);
            }
        }
    }

    fn resume(&self) {
        if let Some(active) = self.active.lock().as_ref() {
            if active.paused.swap(false, Ordering::SeqCst) {
                let _ = active.events.send(EngineEvent::Resume);
            }
        }
    }

    fn cancel(&self) {
        if let Some(active) = self.active.lock().take() {
            active.cancelled.store(true, Ordering::SeqCst);
            debug!("Cancelled utterance {}", active.id);
        }
    }
}
