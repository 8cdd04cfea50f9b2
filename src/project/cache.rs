// Active project cache - the project selected for playback, persisted as JSON
// Lets a session start (or resume offline) without re-fetching the listing

use crate::project::ProjectError;
use crate::project::types::Project;
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = "active-project.json";

/// File-backed store for the currently selected project
#[derive(Debug, Clone)]
pub struct ActiveProjectCache {
    path: PathBuf,
}

impl ActiveProjectCache {
    /// Cache at an explicit file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Cache in the platform data directory
    pub fn in_data_dir() -> Result<Self, ProjectError> {
        let dir = dirs::data_dir().ok_or_else(|| {
            ProjectError::FileSystemError("No data directory on this platform".to_string())
        })?;
        Ok(Self::new(dir.join("numslider").join(CACHE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the selected project
    pub fn save(&self, project: &Project) -> Result<(), ProjectError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProjectError::FileSystemError(format!("Failed to create cache directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(project)?;
        std::fs::write(&self.path, json).map_err(|e| {
            ProjectError::FileSystemError(format!("Failed to write active project: {}", e))
        })?;

        Ok(())
    }

    /// Load the selected project, `None` when nothing was selected yet
    pub fn load(&self) -> Result<Option<Project>, ProjectError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        let project = serde_json::from_str(&json)?;
        Ok(Some(project))
    }

    /// Forget the selection
    pub fn clear(&self) -> Result<(), ProjectError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProjectError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_active_project() {
        let temp_dir = tempdir().unwrap();
        let cache = ActiveProjectCache::new(temp_dir.path().join("nested").join("active.json"));

        assert!(cache.load().unwrap().is_none());

        let mut project = crate::project::Project::new("7", "Night shift", "3,1,4", 5);
        project.current_state = 1;
        cache.save(&project).unwrap();

        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded.id.as_str(), "7");
        assert_eq!(loaded.gap, 5);
        assert_eq!(loaded.current_state, 1);

        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
        // Clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("active.json");
        std::fs::write(&path, "{ not json").unwrap();

        let cache = ActiveProjectCache::new(&path);
        assert!(matches!(cache.load(), Err(ProjectError::Json(_))));
    }
}
