//! Render model
//!
//! Pure data handed back to the driver after every event. No rendering logic
//! here; the REPL and the `run` command decide how it looks.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::PipelineState;
use crate::provider::SimilarOrganization;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// One-line message about what the last event did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A generated text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub text: String,
    /// Computed from posts that a later fetch replaced
    pub stale: bool,
    pub stored_at: DateTime<Utc>,
}

/// Events the operator can send next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    SubmitUrl,
    Analyze,
    GenerateExample,
}

/// Everything the driver needs to draw the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    pub state: PipelineState,
    pub session_started_at: DateTime<Utc>,
    pub company_url: Option<String>,
    pub notices: Vec<Notice>,
    /// Rendered company digest
    pub digest: Option<String>,
    pub competitors: Vec<SimilarOrganization>,
    pub analysis: Option<Section>,
    pub example: Option<Section>,
    pub actions: Vec<Action>,
}

impl RenderModel {
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }

    pub fn can(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}
