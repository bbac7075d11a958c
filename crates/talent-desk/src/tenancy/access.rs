//! Role guard evaluated explicitly at the top of each handler.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::domain::UserRole;
use super::error::ServiceError;

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManagePlans,
    ManageCompanies,
    ManageUsers,
    /// Candidates, vacancies, applications, and the skill catalog.
    ManageTalent,
    Read,
    ViewReports,
}

impl Permission {
    pub const fn allowed_roles(self) -> &'static [UserRole] {
        use UserRole::*;
        match self {
            Self::ManagePlans | Self::ManageCompanies => &[Admin],
            Self::ManageUsers => &[Admin, Manager],
            Self::ManageTalent => &[Admin, Manager, Recruiter],
            Self::Read | Self::ViewReports => &[Admin, Manager, Recruiter, Viewer],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ManagePlans => "manage plans",
            Self::ManageCompanies => "manage companies",
            Self::ManageUsers => "manage users",
            Self::ManageTalent => "manage candidates and vacancies",
            Self::Read => "read tenant data",
            Self::ViewReports => "view reports",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("missing x-actor-role header")]
    MissingRole,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("role {role} may not {action}")]
    Denied {
        role: &'static str,
        action: &'static str,
    },
}

/// Caller identity asserted by the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub role: UserRole,
}

impl Actor {
    pub fn new(role: UserRole) -> Self {
        Self { role }
    }

    pub fn require(&self, permission: Permission) -> Result<(), AccessError> {
        if permission.allowed_roles().contains(&self.role) {
            Ok(())
        } else {
            Err(AccessError::Denied {
                role: self.role.label(),
                action: permission.label(),
            })
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .ok_or(AccessError::MissingRole)?
            .to_str()
            .map_err(|_| AccessError::UnknownRole("<non-ascii>".to_string()))?;
        let role = UserRole::parse(raw).ok_or_else(|| AccessError::UnknownRole(raw.to_string()))?;
        Ok(Self::new(role))
    }
}
