// Player effects - side effects requested by player operations
// The player never performs I/O; the session driver executes these in order

use crate::project::ProjectStatus;
use std::path::Path;
use std::time::Duration;

/// Note sent with every completion report
pub const COMPLETION_NOTE: &str = "Task was completed!";

/// A side effect requested by the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEffect {
    /// Cancel any utterance in flight and speak this value
    Announce(String),
    /// (Re)arm the tick and advance countdowns as a pair
    ArmCountdowns {
        first_advance_in: Duration,
        interval: Duration,
    },
    /// Cancel both countdowns
    DisarmCountdowns,
    /// Best-effort pause checkpoint
    Checkpoint(CheckpointRequest),
    /// Direct index update
    SeekUpdate(SeekRequest),
    /// Finalise the session
    Complete(CompletionRequest),
    /// The player just entered `Completed`
    Finished,
}

/// Pause durability point, always carrying the full position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRequest {
    pub current_index: usize,
    pub elapsed_seconds: u64,
    pub note: Option<String>,
    /// Wall clock label, stamped by whoever sends the request
    pub paused_at: Option<String>,
}

/// Direct index change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekRequest {
    /// Local seek counter, used to discard stale reconciliations
    pub revision: u64,
    pub current_index: usize,
}

/// Completion report
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub elapsed_seconds: u64,
    pub note: String,
    pub status: ProjectStatus,
    pub proof: Option<ProofImage>,
    pub paused_at: Option<String>,
}

/// Image attached to a completion report as proof of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofImage {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ProofImage {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read an image from disk, guessing the MIME type from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "proof".to_string());
        let mime = mime_for(path).to_string();

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_proof_image_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("result.JPG");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let proof = ProofImage::from_file(&path).unwrap();
        assert_eq!(proof.file_name, "result.JPG");
        assert_eq!(proof.mime, "image/jpeg");
        assert_eq!(proof.bytes.len(), 3);
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(mime_for(Path::new("proof.bin")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("proof")), "application/octet-stream");
    }
}
