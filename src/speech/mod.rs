// Speech - reads the current value aloud
// Cancel-and-replace: at most one utterance is ever in flight

#[cfg(target_os = "linux")]
pub mod espeak;
#[cfg(not(target_os = "linux"))]
pub mod native;

use crate::config::SpeechConfig;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
pub use espeak::EspeakAnnouncer;
#[cfg(not(target_os = "linux"))]
pub use native::TtsAnnouncer;

/// Text-to-speech capability used by a session
///
/// Speech is best-effort: implementations log failures instead of
/// returning them.
pub trait Announcer {
    /// Start speaking `text`
    fn speak(&mut self, text: &str);

    /// Stop the utterance in flight, if any
    fn cancel(&mut self);

    /// Cancel whatever is being spoken, then speak `text`
    fn replace(&mut self, text: &str) {
        self.cancel();
        self.speak(text);
    }
}

impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn speak(&mut self, text: &str) {
        (**self).speak(text);
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }

    fn replace(&mut self, text: &str) {
        (**self).replace(text);
    }
}

/// Announcer that only logs (speech disabled or no engine)
#[derive(Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn speak(&mut self, text: &str) {
        tracing::info!(value = %text, "announce");
    }

    fn cancel(&mut self) {}
}

/// Something an announcer was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    Spoke(String),
    Cancelled,
}

/// Announcer that records calls; clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingAnnouncer {
    log: Arc<Mutex<Vec<Utterance>>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Only the spoken texts, in order
    pub fn spoken(&self) -> Vec<String> {
        self.utterances()
            .into_iter()
            .filter_map(|u| match u {
                Utterance::Spoke(text) => Some(text),
                Utterance::Cancelled => None,
            })
            .collect()
    }

    fn push(&self, utterance: Utterance) {
        if let Ok(mut log) = self.log.lock() {
            log.push(utterance);
        }
    }
}

impl Announcer for RecordingAnnouncer {
    fn speak(&mut self, text: &str) {
        self.push(Utterance::Spoke(text.to_string()));
    }

    fn cancel(&mut self) {
        self.push(Utterance::Cancelled);
    }
}

/// Pick the announcer for this platform and configuration
///
/// Falls back to [`LogAnnouncer`] when speech is disabled or the engine
/// cannot be initialised.
pub fn system_announcer(config: &SpeechConfig) -> Box<dyn Announcer> {
    if !config.enabled {
        return Box::new(LogAnnouncer);
    }

    platform_announcer(config)
}

#[cfg(not(target_os = "linux"))]
fn platform_announcer(config: &SpeechConfig) -> Box<dyn Announcer> {
    match TtsAnnouncer::new(config.rate) {
        Ok(announcer) => Box::new(announcer),
        Err(e) => {
            tracing::warn!(error = %e, "text-to-speech unavailable, announcements will be logged");
            Box::new(LogAnnouncer)
        }
    }
}

#[cfg(target_os = "linux")]
fn platform_announcer(config: &SpeechConfig) -> Box<dyn Announcer> {
    Box::new(EspeakAnnouncer::new(config.rate))
}
