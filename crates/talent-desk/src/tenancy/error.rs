use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::access::AccessError;
use super::domain::ResourceKind;
use super::store::StoreError;
use super::validation::ValidationError;
use crate::error::error_response;

/// Error raised by the tenancy services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{message}")]
    QuotaExceeded {
        plan: String,
        resource: ResourceKind,
        limit: u32,
        message: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("blocking task failed: {0}")]
    Task(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Access(AccessError::Denied { .. }) => StatusCode::FORBIDDEN,
            Self::Access(_) => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::PasswordHash(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn conflict_message(constraint: &'static str) -> String {
    let message = match constraint {
        "users_email_key" => "a user with this email already exists",
        "companies_domain_key" => "a company with this domain already exists",
        "skills_name_key" => "a skill with this name already exists",
        "plans_active_type_key" => "an active plan of this type already exists",
        "candidate_skills_pkey" => "skill is already assigned to this candidate",
        "vacancy_skills_pkey" => "skill is already assigned to this vacancy",
        "applications_candidate_vacancy_key" => "candidate already applied to this vacancy",
        other => return format!("unique constraint `{other}` violated"),
    };
    message.to_string()
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(constraint) => {
                Self::Conflict(conflict_message(constraint))
            }
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Store(err) = &self {
            error!(error = %err, "tenant store failure");
            return error_response(status, "internal store failure");
        }
        error_response(status, self.to_string())
    }
}
