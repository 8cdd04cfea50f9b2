// Projects - the unit of work a user plays through
// Backend project model, validation and the cached "active project" selection

pub mod cache;
pub mod types;

pub use cache::ActiveProjectCache;
pub use types::{
    PauseRecord, Project, ProjectId, ProjectStatus, SessionContext, UserContext,
};

/// Project error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    #[error("Project {0} is not assigned for playback (status: {1})")]
    NotPlayable(ProjectId, ProjectStatus),

    #[error("File system error: {0}")]
    FileSystemError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validate a project before building a player session from it
pub fn validate_project(project: &Project) -> Result<(), ProjectError> {
    if project.id.as_str().trim().is_empty() {
        return Err(ProjectError::InvalidStructure(
            "Project id cannot be empty".to_string(),
        ));
    }

    if project.project_name.len() > 255 {
        return Err(ProjectError::InvalidStructure(
            "Project name cannot exceed 255 characters".to_string(),
        ));
    }

    if project.gap == 0 {
        return Err(ProjectError::InvalidStructure(
            "Gap must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validate and additionally require the project to be playable
pub fn validate_playable(project: &Project) -> Result<(), ProjectError> {
    validate_project(project)?;

    if !project.status.is_playable() {
        return Err(ProjectError::NotPlayable(project.id.clone(), project.status));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project_valid() {
        let project = Project::new("p1", "Batch", "1,2,3", 2);
        assert!(validate_project(&project).is_ok());
        assert!(validate_playable(&project).is_ok());
    }

    #[test]
    fn test_validate_project_zero_gap() {
        let project = Project::new("p1", "Batch", "1,2,3", 0);
        let result = validate_project(&project);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Gap must be"));
    }

    #[test]
    fn test_state_past_end_is_playable() {
        // The descriptor clamps it, the session completes at once
        let mut project = Project::new("p1", "Batch", "1,2,3", 2);
        project.current_state = 3;
        assert!(validate_playable(&project).is_ok());

        project.current_state = 9;
        assert!(validate_playable(&project).is_ok());
    }

    #[test]
    fn test_validate_playable_rejects_reviewed_project() {
        let mut project = Project::new("p1", "Batch", "1,2,3", 2);
        project.status = ProjectStatus::UnderReview;
        assert!(matches!(
            validate_playable(&project),
            Err(ProjectError::NotPlayable(_, ProjectStatus::UnderReview))
        ));
    }
}
