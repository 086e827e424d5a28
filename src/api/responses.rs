//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    error::Error,
    render::RenderedActivity,
    services::Profile,
    state::{Activity, ActivityId, ActivityKind},
    store::Template,
};

/// Driving-side view of one activity
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub id: ActivityId,
    pub title: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub seconds: Option<u64>,
    pub counting: bool,
    pub completed: bool,
}

impl From<&Activity> for ActivityView {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id(),
            title: activity.title(),
            kind: activity.kind.clone(),
            seconds: activity.seconds,
            counting: activity.timer.is_counting(),
            completed: activity.timer.is_completed(),
        }
    }
}

/// Response to starting an operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub activity: ActivityView,
    /// Index of the template saved alongside, if one was requested
    pub template_index: Option<usize>,
    /// Set when the operation started but a follow-up step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl OperationResponse {
    pub fn started(message: String, activity: &Activity, saved: TemplateSave) -> Self {
        let (template_index, warning) = match saved {
            TemplateSave::Skipped => (None, None),
            TemplateSave::Saved(index) => (Some(index), None),
            TemplateSave::Failed(reason) => (None, Some(format!("template not saved: {}", reason))),
        };
        Self {
            status: "started".to_string(),
            message,
            timestamp: Utc::now(),
            activity: ActivityView::from(activity),
            template_index,
            warning,
        }
    }
}

/// Result of the optional template save that follows a started operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSave {
    Skipped,
    Saved(usize),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub activity: ActivityView,
}

impl ActivityResponse {
    pub fn ok(activity: &Activity) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            activity: ActivityView::from(activity),
        }
    }
}

/// Rendered activity list as the popup shows it
#[derive(Debug, Clone, Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<RenderedActivity>,
    pub has_active_items: bool,
    pub live: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    /// Name shown in the header, which is the base name while a rename runs
    pub display_name: Option<String>,
    pub has_active_items: bool,
    pub uptime: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

/// A recalled template plus the value to put in the form field
#[derive(Debug, Clone, Serialize)]
pub struct RecallResponse {
    pub template: Template,
    pub field_value: String,
    pub has_time: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendRequest {
    pub seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoveTemplateRequest {
    /// What the caller saw at the index, checked before removing
    pub expected: Option<Template>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::StaleIndex { .. } | Error::Busy(_) => StatusCode::CONFLICT,
            Error::OperationFailed(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) | Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
