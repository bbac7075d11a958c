//! Records held by the tenant store plus the status vocabularies and their state machines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }
    };
}

entity_id!(
    /// Subscription tier identifier.
    PlanId
);
entity_id!(
    /// Tenant identifier; every quota is scoped by it.
    CompanyId
);
entity_id!(UserId);
entity_id!(CandidateId);
entity_id!(VacancyId);
entity_id!(ApplicationId);
entity_id!(SkillId);

/// Resource kinds whose per-tenant count is capped by the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Users,
    Candidates,
    Vacancies,
}

impl ResourceKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Users, Self::Candidates, Self::Vacancies]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Candidates => "candidates",
            Self::Vacancies => "vacancies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    Free,
    Basic,
    Professional,
    Enterprise,
}

impl PlanType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Basic => "BASIC",
            Self::Professional => "PROFESSIONAL",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub max_users: u32,
    pub max_candidates: u32,
    pub max_vacancies: u32,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn limit_for(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Users => self.max_users,
            ResourceKind::Candidates => self.max_candidates,
            ResourceKind::Vacancies => self.max_vacancies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyStatus {
    Active,
    Inactive,
    Trial,
}

impl CompanyStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Active, Self::Trial, Self::Inactive]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Trial => "TRIAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub status: CompanyStatus,
    pub plan_id: PlanId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Recruiter,
    Viewer,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Recruiter => "RECRUITER",
            Self::Viewer => "VIEWER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "MANAGER" => Some(Self::Manager),
            "RECRUITER" => Some(Self::Recruiter),
            "VIEWER" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Response shape; the password hash never leaves the store.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            status: self.status,
            company_id: self.company_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub company_id: Option<CompanyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Active,
    Inactive,
    InProcess,
    Hired,
}

impl CandidateStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Active, Self::InProcess, Self::Hired, Self::Inactive]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::InProcess => "IN_PROCESS",
            Self::Hired => "HIRED",
        }
    }

    /// Moves allowed through a regular update. `Inactive` is only entered via soft delete.
    pub fn can_transition_to(self, next: Self) -> bool {
        use CandidateStatus::*;
        self == next
            || matches!(
                (self, next),
                (Active, InProcess)
                    | (InProcess, Active)
                    | (InProcess, Hired)
                    | (Hired, InProcess)
                    | (Inactive, Active)
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub company_id: CompanyId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSkill {
    pub candidate_id: CandidateId,
    pub skill_id: SkillId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub candidate_id: CandidateId,
    pub company: String,
    pub title: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub candidate_id: CandidateId,
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VacancyStatus {
    Draft,
    Open,
    Closed,
    Paused,
    Cancelled,
}

impl VacancyStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Draft,
            Self::Open,
            Self::Paused,
            Self::Closed,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Paused => "PAUSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use VacancyStatus::*;
        self == next
            || matches!(
                (self, next),
                (Draft, Open)
                    | (Draft, Cancelled)
                    | (Open, Closed)
                    | (Open, Paused)
                    | (Open, Cancelled)
                    | (Paused, Open)
                    | (Paused, Closed)
                    | (Paused, Cancelled)
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vacancy {
    pub id: VacancyId,
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub status: VacancyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancySkill {
    pub vacancy_id: VacancyId,
    pub skill_id: SkillId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Interview,
    Offered,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Pending,
            Self::Reviewing,
            Self::Interview,
            Self::Offered,
            Self::Accepted,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewing => "REVIEWING",
            Self::Interview => "INTERVIEW",
            Self::Offered => "OFFERED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use ApplicationStatus::*;
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Rejected)
                | (Pending, Reviewing)
                | (Reviewing, Interview)
                | (Interview, Offered)
                | (Offered, Accepted)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub vacancy_id: VacancyId,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate aggregate: skills, experience, education, and applications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateWithRelations {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub skills: Vec<Skill>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub applications: Vec<Application>,
}

/// Vacancy aggregate: required skills and applications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyWithRelations {
    #[serde(flatten)]
    pub vacancy: Vacancy,
    pub skills: Vec<Skill>,
    pub applications: Vec<Application>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacancy_cannot_leave_terminal_states() {
        for next in VacancyStatus::ordered() {
            if next != VacancyStatus::Closed {
                assert!(!VacancyStatus::Closed.can_transition_to(next));
            }
            if next != VacancyStatus::Cancelled {
                assert!(!VacancyStatus::Cancelled.can_transition_to(next));
            }
        }
        assert!(VacancyStatus::Draft.can_transition_to(VacancyStatus::Open));
        assert!(!VacancyStatus::Draft.can_transition_to(VacancyStatus::Closed));
    }

    #[test]
    fn candidate_enters_inactive_only_through_removal() {
        for status in CandidateStatus::ordered() {
            if status != CandidateStatus::Inactive {
                assert!(!status.can_transition_to(CandidateStatus::Inactive));
            }
        }
        assert!(CandidateStatus::Inactive.can_transition_to(CandidateStatus::Active));
        assert!(!CandidateStatus::Active.can_transition_to(CandidateStatus::Hired));
    }

    #[test]
    fn application_rejection_is_reachable_until_terminal() {
        assert!(ApplicationStatus::Interview.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Accepted.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Offered));
    }

    #[test]
    fn ids_round_trip_through_strings() {
        let id = CandidateId::generate();
        let parsed: CandidateId = id.to_string().parse().expect("uuid parses");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<CandidateId>().is_err());
    }
}
