// HTTP backend - progress store and project source over the REST API

use crate::project::{Project, ProjectId, UserContext};
use crate::sequencer::{CheckpointRequest, CompletionRequest, ProofImage, SeekRequest};
use crate::store::payload::{
    CheckpointPayload, CompletionPayload, ErrorBody, ProjectEnvelope, ProjectPage, SeekPayload,
};
use crate::store::{ProgressStore, ProjectSource, StoreError};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Upper bound on listing pages walked when looking a project up
const MAX_PAGES: u32 = 100;

/// Client for the verification backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("numslider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Use an existing client (shared connection pool)
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, project_id: &ProjectId) -> String {
        format!("{}/project/{}", self.base_url, project_id)
    }

    fn projects_url(&self, user_id: &str) -> String {
        format!("{}/projects/{}", self.base_url, user_id)
    }

    /// One page of the user's projects
    pub async fn list_projects(
        &self,
        user: &UserContext,
        search: &str,
        page: u32,
    ) -> Result<ProjectPage, StoreError> {
        let page_param = page.to_string();
        let response = self
            .client
            .get(self.projects_url(&user.id))
            .query(&[("search", search), ("page", page_param.as_str())])
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<ProjectPage>().await?)
    }

    async fn patch_project<T: serde::Serialize + ?Sized>(
        &self,
        project_id: &ProjectId,
        body: &T,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .client
            .patch(self.project_url(project_id))
            .json(body)
            .send()
            .await?;

        check_status(response).await
    }
}

impl ProgressStore for HttpBackend {
    async fn checkpoint(
        &self,
        project_id: &ProjectId,
        request: &CheckpointRequest,
    ) -> Result<(), StoreError> {
        tracing::debug!(project = %project_id, index = request.current_index, "sending checkpoint");
        self.patch_project(project_id, &CheckpointPayload::from(request))
            .await?;
        Ok(())
    }

    async fn seek_update(
        &self,
        project_id: &ProjectId,
        request: &SeekRequest,
    ) -> Result<Project, StoreError> {
        tracing::debug!(project = %project_id, index = request.current_index, "sending seek");
        let response = self
            .patch_project(project_id, &SeekPayload::from(request))
            .await?;
        let envelope: ProjectEnvelope = response.json().await?;
        Ok(envelope.project)
    }

    async fn complete(
        &self,
        project_id: &ProjectId,
        request: &CompletionRequest,
    ) -> Result<(), StoreError> {
        let payload = CompletionPayload::from(request);

        let Some(proof) = &request.proof else {
            self.patch_project(project_id, &payload).await?;
            return Ok(());
        };

        tracing::debug!(
            project = %project_id,
            file = %proof.file_name,
            bytes = proof.bytes.len(),
            "sending completion with proof"
        );
        let form = completion_form(&payload, proof)?;
        let response = self
            .client
            .patch(self.project_url(project_id))
            .multipart(form)
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}

impl ProjectSource for HttpBackend {
    async fn fetch_project(
        &self,
        user: &UserContext,
        project_id: &ProjectId,
    ) -> Result<Project, StoreError> {
        let mut page = 1;

        loop {
            let listing = self.list_projects(user, "", page).await?;
            if let Some(project) = listing.projects.into_iter().find(|p| &p.id == project_id) {
                return Ok(project);
            }

            let last_page = listing.pagination.total_pages.clamp(1, MAX_PAGES);
            if page >= last_page {
                return Err(StoreError::NotFound(project_id.clone()));
            }
            page += 1;
        }
    }
}

fn completion_form(payload: &CompletionPayload<'_>, proof: &ProofImage) -> Result<Form, StoreError> {
    let file_part = Part::bytes(proof.bytes.clone())
        .file_name(proof.file_name.clone())
        .mime_str(&proof.mime)?;

    let mut form = Form::new()
        .text("currentState", payload.current_state.to_string())
        .text("note", payload.note.to_string())
        .text("passedTime", payload.passed_time.clone())
        .text("status", payload.status)
        .part("resultProof", file_part);

    if let Some(pause_at) = payload.pause_at {
        form = form.text("pauseAt", pause_at.to_string());
    }

    Ok(form)
}

/// Turn non-2xx responses into `StoreError::Status`, keeping the server's message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => fallback,
    };

    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}
