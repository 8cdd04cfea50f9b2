// Native text-to-speech through the platform engine

use crate::speech::Announcer;

pub struct TtsAnnouncer {
    engine: tts::Tts,
}

impl TtsAnnouncer {
    /// Initialise the platform engine; `rate` scales its normal speaking rate
    pub fn new(rate: f32) -> Result<Self, tts::Error> {
        let mut engine = tts::Tts::default()?;
        let scaled = (engine.normal_rate() * rate).clamp(engine.min_rate(), engine.max_rate());
        if let Err(e) = engine.set_rate(scaled) {
            tracing::debug!(error = %e, "speech rate not supported");
        }
        Ok(Self { engine })
    }
}

impl Announcer for TtsAnnouncer {
    fn speak(&mut self, text: &str) {
        if let Err(e) = self.engine.speak(text, false) {
            tracing::warn!(error = %e, "speech failed");
        }
    }

    fn cancel(&mut self) {
        if let Err(e) = self.engine.stop() {
            tracing::debug!(error = %e, "speech stop failed");
        }
    }

    fn replace(&mut self, text: &str) {
        // interrupt = true stops the current utterance in the same call
        if let Err(e) = self.engine.speak(text, true) {
            tracing::warn!(error = %e, "speech failed");
        }
    }
}
