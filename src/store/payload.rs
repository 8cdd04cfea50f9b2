// Wire payloads exchanged with the verification backend

use crate::project::Project;
use crate::sequencer::{CheckpointRequest, CompletionRequest, SeekRequest, format_clock};
use serde::{Deserialize, Serialize};

/// Body of `PATCH /project/{id}` for a pause checkpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointPayload<'a> {
    pub current_state: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_at: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'a str>,
    pub passed_time: String,
}

impl<'a> From<&'a CheckpointRequest> for CheckpointPayload<'a> {
    fn from(request: &'a CheckpointRequest) -> Self {
        Self {
            current_state: request.current_index,
            pause_at: request.paused_at.as_deref(),
            note: request.note.as_deref(),
            passed_time: format_clock(request.elapsed_seconds),
        }
    }
}

/// Body of `PATCH /project/{id}` for a seek
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekPayload {
    pub current_state: usize,
}

impl From<&SeekRequest> for SeekPayload {
    fn from(request: &SeekRequest) -> Self {
        Self {
            current_state: request.current_index,
        }
    }
}

/// Body of `PATCH /project/{id}` for a completion report
///
/// The position is reset to 0 so a re-assigned project starts over.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload<'a> {
    pub current_state: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_at: Option<&'a str>,
    pub note: &'a str,
    pub passed_time: String,
    pub status: &'static str,
}

impl<'a> From<&'a CompletionRequest> for CompletionPayload<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            current_state: 0,
            pause_at: request.paused_at.as_deref(),
            note: &request.note,
            passed_time: format_clock(request.elapsed_seconds),
            status: request.status.as_wire(),
        }
    }
}

/// `{ project }` envelope returned by project updates
#[derive(Debug, Deserialize)]
pub struct ProjectEnvelope {
    pub project: Project,
}

/// Response of `GET /projects/{userId}`
#[derive(Debug, Deserialize)]
pub struct ProjectPage {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

/// Error body, `{ message }`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
