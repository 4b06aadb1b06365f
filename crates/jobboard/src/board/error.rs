use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::repository::RepositoryError;

/// Invariant a rejected operation would have broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyApplied,
    VacancyFull,
    QuotaExceeded,
    CapacityBelowApplications,
    EmailTaken,
    LastAdministrator,
    Duplicate,
}

impl ConflictReason {
    pub const fn label(self) -> &'static str {
        match self {
            ConflictReason::AlreadyApplied => "already applied",
            ConflictReason::VacancyFull => "vacancy full",
            ConflictReason::QuotaExceeded => "candidate quota exceeded",
            ConflictReason::CapacityBelowApplications => {
                "capacity below current applications"
            }
            ConflictReason::EmailTaken => "email already registered",
            ConflictReason::LastAdministrator => "cannot remove the last administrator",
            ConflictReason::Duplicate => "record already exists",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error surfaced by every job-board operation. Each kind maps to one caller-visible meaning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("authentication required: {0}")]
    Unauthenticated(&'static str),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("conflict: {0}")]
    Conflict(ConflictReason),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("storage temporarily unavailable: {0}")]
    Transient(String),
}

impl BoardError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            BoardError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BoardError::Forbidden(_) => StatusCode::FORBIDDEN,
            BoardError::NotFound { .. } => StatusCode::NOT_FOUND,
            BoardError::InvalidState(_) => StatusCode::BAD_REQUEST,
            BoardError::Conflict(_) => StatusCode::CONFLICT,
            BoardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BoardError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable kind for API payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            BoardError::Unauthenticated(_) => "unauthenticated",
            BoardError::Forbidden(_) => "forbidden",
            BoardError::NotFound { .. } => "not_found",
            BoardError::InvalidState(_) => "invalid_state",
            BoardError::Conflict(_) => "conflict",
            BoardError::Validation(_) => "validation",
            BoardError::Transient(_) => "transient",
        }
    }
}

impl From<RepositoryError> for BoardError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::DuplicateApplication => Self::Conflict(ConflictReason::AlreadyApplied),
            RepositoryError::VacancyInactive => Self::InvalidState("vacancy not active"),
            RepositoryError::CapacityExceeded => Self::Conflict(ConflictReason::VacancyFull),
            RepositoryError::CapacityBelowApplications { .. } => {
                Self::Conflict(ConflictReason::CapacityBelowApplications)
            }
            RepositoryError::QuotaExceeded => Self::Conflict(ConflictReason::QuotaExceeded),
            RepositoryError::EmailTaken => Self::Conflict(ConflictReason::EmailTaken),
            RepositoryError::LastAdministrator => {
                Self::Conflict(ConflictReason::LastAdministrator)
            }
            RepositoryError::Conflict => Self::Conflict(ConflictReason::Duplicate),
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Unavailable(reason) => Self::Transient(reason),
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (self.status_code(), body).into_response()
    }
}
