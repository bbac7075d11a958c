//! Tenant-scoped resources, plan quotas, and the HTTP surface over them.
//!
//! Every service receives the same [`TenantStore`] handle at construction. Operations that
//! create quota-bound rows check the quota and insert inside one store transaction.

pub mod access;
pub mod applications;
pub mod companies;
pub mod domain;
pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod memory;
pub mod payloads;
pub mod plans;
pub mod quota;
pub mod router;
pub mod skills;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access::{AccessError, Actor, Permission, ACTOR_ROLE_HEADER};
pub use applications::ApplicationService;
pub use companies::CompanyService;
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Candidate, CandidateId, CandidateStatus,
    CandidateWithRelations, Company, CompanyId, CompanyStatus, Plan, PlanId, PlanType,
    ResourceKind, Skill, SkillId, User, UserId, UserRole, UserStatus, UserView, Vacancy,
    VacancyId, VacancyStatus, VacancyWithRelations,
};
pub use error::ServiceError;
pub use lifecycle::{RemovalOutcome, RemovalReport, ResourceLifecycleManager, ResourceRef};
pub use memory::{FixtureError, MemoryStore, TenantSnapshot};
pub use plans::PlanService;
pub use quota::{check_quota, QuotaDecision, QuotaUsage, QuotaUsageEntry};
pub use router::{tenancy_router, TenancyServices};
pub use skills::SkillCatalog;
pub use store::{StoreError, TenantReader, TenantStore, TenantWriter};
pub use validation::{Validate, ValidationError};
