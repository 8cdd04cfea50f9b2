// Types for projects as served by the verification backend

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Project identifier
///
/// The backend is not consistent about numeric vs string ids, so both are
/// accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Lenient::deserialize(deserializer)? {
            Lenient::Number(n) => Ok(Self(n.to_string())),
            Lenient::Text(s) => Ok(Self(s)),
        }
    }
}

/// Review status of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "UNDERREVIEW")]
    UnderReview,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl ProjectStatus {
    /// Wire name used by the backend
    pub fn as_wire(&self) -> &'static str {
        match self {
            ProjectStatus::Assigned => "ASSIGNED",
            ProjectStatus::UnderReview => "UNDERREVIEW",
            ProjectStatus::Approved => "APPROVED",
            ProjectStatus::Rejected => "REJECTED",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Assigned => "Assigned",
            ProjectStatus::UnderReview => "Under Review",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Rejected => "Rejected",
        }
    }

    /// Check whether the review workflow allows moving to `next`
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (ProjectStatus::Assigned, ProjectStatus::UnderReview)
                | (ProjectStatus::UnderReview, ProjectStatus::Approved)
                | (ProjectStatus::UnderReview, ProjectStatus::Rejected)
                | (ProjectStatus::Rejected, ProjectStatus::Assigned)
        )
    }

    /// Only assigned projects can be played
    pub fn is_playable(&self) -> bool {
        matches!(self, ProjectStatus::Assigned)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pause annotation stored by the backend (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,
    /// Wall clock label ("HH:MM") of the pause
    #[serde(default)]
    pub paused_at: String,
    #[serde(default)]
    pub note: String,
}

/// A verification project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    #[serde(default)]
    pub project_name: String,
    /// Comma separated number sequence
    #[serde(default)]
    pub total_numbers: String,
    /// Seconds per number
    #[serde(default = "default_gap", deserialize_with = "lenient_u32")]
    pub gap: u32,
    /// Index the user reached in a previous session
    #[serde(default, deserialize_with = "lenient_index")]
    pub current_state: u32,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub passed_time: Option<String>,
    /// Real reference image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image1: Option<String>,
    /// AI generated reference image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_proof: Option<String>,
    #[serde(default)]
    pub pause_notes: Vec<PauseRecord>,
}

fn default_gap() -> u32 {
    2
}

impl Project {
    /// Create a freshly assigned project
    pub fn new(id: impl Into<String>, name: impl Into<String>, numbers: &str, gap: u32) -> Self {
        Self {
            id: ProjectId::new(id),
            project_name: name.into(),
            total_numbers: numbers.to_string(),
            gap,
            current_state: 0,
            status: ProjectStatus::Assigned,
            handled_by: None,
            passed_time: None,
            image1: None,
            image2: None,
            result_proof: None,
            pause_notes: Vec::new(),
        }
    }

    /// Split `total_numbers` into the announced values
    ///
    /// Items are trimmed but keep their position, so `current_state` indexes
    /// the same item the backend means. Trailing empty items are dropped.
    pub fn numbers(&self) -> Vec<String> {
        let mut numbers: Vec<String> = self
            .total_numbers
            .split(',')
            .map(|n| n.trim().to_string())
            .collect();

        while numbers.last().is_some_and(|n| n.is_empty()) {
            numbers.pop();
        }
        numbers
    }

    /// "current / total" progress label used in listings
    pub fn progress_label(&self) -> String {
        format!("{} / {}", self.current_state, self.numbers().len())
    }
}

/// The signed-in user, passed explicitly instead of living in global state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl UserContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
        }
    }
}

/// Everything a player session needs to know about who plays what
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: uuid::Uuid,
    pub user: UserContext,
    pub project_id: ProjectId,
}

impl SessionContext {
    pub fn new(user: UserContext, project_id: ProjectId) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4(),
            user,
            project_id,
        }
    }
}

/// Numbers and strings both show up for numeric fields
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(serde_json::Number),
    Text(String),
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    let raw = Option::<Lenient>::deserialize(deserializer)?;
    match raw {
        None => Ok(0),
        Some(Lenient::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", n))),
        Some(Lenient::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(Lenient::Text(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| D::Error::custom(format!("invalid integer {:?}: {}", s, e))),
    }
}

/// Like [`lenient_u32`], but negative positions read as 0
fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    let raw = Option::<Lenient>::deserialize(deserializer)?;
    let value = match raw {
        None => return Ok(0),
        Some(Lenient::Number(n)) => n.as_i64().or_else(|| n.as_u64().map(|_| i64::MAX)),
        Some(Lenient::Text(s)) if s.trim().is_empty() => return Ok(0),
        Some(Lenient::Text(s)) => s.trim().parse::<i64>().ok(),
    };

    value
        .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        .ok_or_else(|| D::Error::custom("expected an integer position"))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        None => None,
        Some(Lenient::Number(n)) => Some(n.to_string()),
        Some(Lenient::Text(s)) => Some(s),
    })
}
