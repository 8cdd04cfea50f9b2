// In-memory store - offline sessions and tests
// Applies writes the way the backend does and records every call

use crate::project::{PauseRecord, Project, ProjectId, ProjectStatus, UserContext};
use crate::sequencer::{CheckpointRequest, CompletionRequest, SeekRequest, format_clock};
use crate::store::{ProgressStore, ProjectSource, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A call received by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Checkpoint(ProjectId, CheckpointRequest),
    Seek(ProjectId, SeekRequest),
    Complete(ProjectId, CompletionRequest),
}

#[derive(Debug, Default)]
struct Inner {
    projects: HashMap<ProjectId, Project>,
    calls: Vec<StoreCall>,
    failing: bool,
}

/// Shared in-memory store (clones see the same data)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one project
    pub fn with_project(project: Project) -> Self {
        let store = Self::new();
        store.insert(project);
        store
    }

    pub fn insert(&self, project: Project) {
        self.lock().projects.insert(project.id.clone(), project);
    }

    pub fn project(&self, project_id: &ProjectId) -> Option<Project> {
        self.lock().projects.get(project_id).cloned()
    }

    /// Make every following call fail (simulates an unreachable backend)
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind, keep going
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply<T>(
        &self,
        call: StoreCall,
        update: impl FnOnce(&mut Project) -> T,
    ) -> Result<T, StoreError> {
        let mut inner = self.lock();
        inner.calls.push(call.clone());

        if inner.failing {
            return Err(StoreError::Unavailable("memory store set to fail".to_string()));
        }

        let project_id = match &call {
            StoreCall::Checkpoint(id, _) | StoreCall::Seek(id, _) | StoreCall::Complete(id, _) => {
                id
            }
        };
        let project = inner
            .projects
            .get_mut(project_id)
            .ok_or_else(|| StoreError::NotFound(project_id.clone()))?;

        Ok(update(project))
    }
}

impl ProgressStore for MemoryStore {
    async fn checkpoint(
        &self,
        project_id: &ProjectId,
        request: &CheckpointRequest,
    ) -> Result<(), StoreError> {
        self.apply(
            StoreCall::Checkpoint(project_id.clone(), request.clone()),
            |project| {
                project.current_state = request.current_index as u32;
                project.passed_time = Some(format_clock(request.elapsed_seconds));
                if let Some(note) = &request.note {
                    project.pause_notes.push(PauseRecord {
                        id: None,
                        paused_at: request.paused_at.clone().unwrap_or_default(),
                        note: note.clone(),
                    });
                }
            },
        )
    }

    async fn seek_update(
        &self,
        project_id: &ProjectId,
        request: &SeekRequest,
    ) -> Result<Project, StoreError> {
        self.apply(StoreCall::Seek(project_id.clone(), request.clone()), |project| {
            project.current_state = request.current_index as u32;
            project.clone()
        })
    }

    async fn complete(
        &self,
        project_id: &ProjectId,
        request: &CompletionRequest,
    ) -> Result<(), StoreError> {
        self.apply(
            StoreCall::Complete(project_id.clone(), request.clone()),
            |project| {
                project.current_state = 0;
                project.passed_time = Some(format_clock(request.elapsed_seconds));
                project.status = ProjectStatus::UnderReview;
                project.result_proof = request.proof.as_ref().map(|p| p.file_name.clone());
                project.pause_notes.push(PauseRecord {
                    id: None,
                    paused_at: request.paused_at.clone().unwrap_or_default(),
                    note: request.note.clone(),
                });
            },
        )
    }
}

impl ProjectSource for MemoryStore {
    async fn fetch_project(
        &self,
        _user: &UserContext,
        project_id: &ProjectId,
    ) -> Result<Project, StoreError> {
        self.project(project_id)
            .ok_or_else(|| StoreError::NotFound(project_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::COMPLETION_NOTE;

    #[tokio::test]
    async fn test_checkpoint_appends_pause_note() {
        let store = MemoryStore::with_project(Project::new("1", "Batch", "1,2,3", 2));
        let id = ProjectId::new("1");

        let request = CheckpointRequest {
            current_index: 2,
            elapsed_seconds: 61,
            note: Some("break".to_string()),
            paused_at: Some("12:00".to_string()),
        };
        store.checkpoint(&id, &request).await.unwrap();

        let project = store.project(&id).unwrap();
        assert_eq!(project.current_state, 2);
        assert_eq!(project.passed_time.as_deref(), Some("1:01"));
        assert_eq!(project.pause_notes.len(), 1);
        assert_eq!(project.pause_notes[0].note, "break");
        assert_eq!(store.calls(), vec![StoreCall::Checkpoint(id, request)]);
    }

    #[tokio::test]
    async fn test_complete_moves_to_review() {
        let store = MemoryStore::with_project(Project::new("1", "Batch", "1,2,3", 2));
        let id = ProjectId::new("1");

        let request = CompletionRequest {
            elapsed_seconds: 6,
            note: COMPLETION_NOTE.to_string(),
            status: ProjectStatus::UnderReview,
            proof: None,
            paused_at: None,
        };
        store.complete(&id, &request).await.unwrap();

        let project = store.project(&id).unwrap();
        assert_eq!(project.status, ProjectStatus::UnderReview);
        assert_eq!(project.current_state, 0);
    }

    #[tokio::test]
    async fn test_failing_store_records_but_rejects() {
        let store = MemoryStore::with_project(Project::new("1", "Batch", "1,2,3", 2));
        store.set_failing(true);
        let id = ProjectId::new("1");

        let result = store
            .seek_update(&id, &SeekRequest { revision: 1, current_index: 1 })
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.calls().len(), 1);
        assert_eq!(store.project(&id).unwrap().current_state, 0);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let store = MemoryStore::new();
        let result = store
            .fetch_project(&UserContext::new("u"), &ProjectId::new("nope"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
