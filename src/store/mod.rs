// Progress store and project source - the remote collaborators of a session
//
// All calls are asynchronous and may fail; callers treat them as best-effort
// and never roll local playback back because of a failure. Every write
// carries the full position (index + elapsed) so out-of-order arrival is
// harmless under last-write-wins.

pub mod http;
pub mod memory;
pub mod payload;

use crate::project::{ActiveProjectCache, Project, ProjectError, ProjectId, UserContext};
use crate::sequencer::{CheckpointRequest, CompletionRequest, SeekRequest};
use std::future::Future;

pub use http::HttpBackend;
pub use memory::{MemoryStore, StoreCall};

/// Errors returned by store and source implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project {0} not found")]
    NotFound(ProjectId),

    #[error("Project cache error: {0}")]
    Project(#[from] ProjectError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persists playback position, pause notes and completion
pub trait ProgressStore: Clone + Send + Sync + 'static {
    /// Best-effort pause checkpoint
    fn checkpoint(
        &self,
        project_id: &ProjectId,
        request: &CheckpointRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persist a direct index change, answering with the stored project
    fn seek_update(
        &self,
        project_id: &ProjectId,
        request: &SeekRequest,
    ) -> impl Future<Output = Result<Project, StoreError>> + Send;

    /// Finalise the session
    fn complete(
        &self,
        project_id: &ProjectId,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Supplies the project a session plays
pub trait ProjectSource {
    fn fetch_project(
        &self,
        user: &UserContext,
        project_id: &ProjectId,
    ) -> impl Future<Output = Result<Project, StoreError>> + Send;
}

impl ProjectSource for ActiveProjectCache {
    async fn fetch_project(
        &self,
        _user: &UserContext,
        project_id: &ProjectId,
    ) -> Result<Project, StoreError> {
        match self.load()? {
            Some(project) if &project.id == project_id => Ok(project),
            _ => Err(StoreError::NotFound(project_id.clone())),
        }
    }
}

/// Fetch from `source`, keeping `cache` in step and falling back to it
///
/// Without a cache a failed fetch is returned as is.
pub async fn fetch_with_cache<P: ProjectSource>(
    source: &P,
    cache: Option<&ActiveProjectCache>,
    user: &UserContext,
    project_id: &ProjectId,
) -> Result<Project, StoreError> {
    let error = match source.fetch_project(user, project_id).await {
        Ok(project) => {
            if let Some(Err(e)) = cache.map(|cache| cache.save(&project)) {
                tracing::warn!(error = %e, "could not cache the active project");
            }
            return Ok(project);
        }
        Err(e) => e,
    };

    let Some(cache) = cache else {
        return Err(error);
    };

    tracing::warn!(error = %error, "project fetch failed, trying the cached copy");
    cache
        .fetch_project(user, project_id)
        .await
        .map_err(|_| error)
}
