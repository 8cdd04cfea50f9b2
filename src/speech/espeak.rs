// espeak-backed speech for Linux, where the native engine is not built

use crate::speech::Announcer;
use std::process::{Child, Command, Stdio};

/// Base espeak rate in words per minute
const ESPEAK_WPM: f32 = 175.0;

pub struct EspeakAnnouncer {
    words_per_minute: u32,
    current: Option<Child>,
}

impl EspeakAnnouncer {
    pub fn new(rate: f32) -> Self {
        Self {
            words_per_minute: (ESPEAK_WPM * rate).round().max(80.0) as u32,
            current: None,
        }
    }
}

impl Announcer for EspeakAnnouncer {
    fn speak(&mut self, text: &str) {
        let spawned = Command::new("espeak")
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => self.current = Some(child),
            Err(e) => tracing::info!(value = %text, error = %e, "espeak unavailable, announce"),
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already exited is fine
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for EspeakAnnouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
