//! Capability traits for the tenant store.
//!
//! Services never hold an ambient client: they receive a store handle at construction and
//! run every multi-step mutation inside [`TenantStore::write`], which is a single serializable
//! transaction. Reads that span several tables go through [`TenantStore::read`] so they observe
//! one consistent snapshot.

use serde::Deserialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Candidate, CandidateId, CandidateSkill,
    CandidateStatus, Company, CompanyId, CompanyStatus, Education, Experience, Plan, PlanId,
    ResourceKind, Skill, SkillId, User, UserId, UserStatus, Vacancy, VacancyId, VacancySkill,
    VacancyStatus,
};

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint `{0}` violated")]
    UniqueViolation(&'static str),
    #[error("foreign key `{0}` violated")]
    ForeignKeyViolation(&'static str),
    #[error("{table} row {id} does not exist")]
    MissingRow { table: &'static str, id: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFilter {
    pub status: Option<CompanyStatus>,
    pub plan_id: Option<PlanId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub company_id: Option<CompanyId>,
    pub status: Option<UserStatus>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFilter {
    pub company_id: Option<CompanyId>,
    pub status: Option<CandidateStatus>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyFilter {
    pub company_id: Option<CompanyId>,
    pub status: Option<VacancyStatus>,
}

/// `company_id` matches through the application's vacancy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub candidate_id: Option<CandidateId>,
    pub vacancy_id: Option<VacancyId>,
    pub company_id: Option<CompanyId>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn for_candidate(id: CandidateId) -> Self {
        Self {
            candidate_id: Some(id),
            ..Self::default()
        }
    }

    pub fn for_vacancy(id: VacancyId) -> Self {
        Self {
            vacancy_id: Some(id),
            ..Self::default()
        }
    }
}

/// Read capability. List operations return rows newest first.
pub trait TenantReader {
    fn plan(&self, id: PlanId) -> Result<Option<Plan>, StoreError>;
    fn plans(&self) -> Result<Vec<Plan>, StoreError>;
    fn count_companies_on_plan(&self, id: PlanId) -> Result<u64, StoreError>;

    fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    fn companies(&self, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError>;

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;

    fn skill(&self, id: SkillId) -> Result<Option<Skill>, StoreError>;
    fn skills(&self) -> Result<Vec<Skill>, StoreError>;

    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;
    fn candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, StoreError>;
    fn candidate_skills(&self, id: CandidateId) -> Result<Vec<Skill>, StoreError>;
    fn experience(&self, id: CandidateId) -> Result<Vec<Experience>, StoreError>;
    fn education(&self, id: CandidateId) -> Result<Vec<Education>, StoreError>;

    fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, StoreError>;
    fn vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, StoreError>;
    fn vacancy_skills(&self, id: VacancyId) -> Result<Vec<Skill>, StoreError>;

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError>;
    fn applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, StoreError>;

    /// Rows of `kind` owned by `company`, whatever their status.
    fn count_resources(&self, kind: ResourceKind, company: CompanyId) -> Result<u64, StoreError>;
    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError>;
}

/// Write capability, only reachable inside [`TenantStore::write`].
///
/// Implementations enforce the relational constraints: unique user emails, unique skill names,
/// unique (candidate, skill), (vacancy, skill) and (candidate, vacancy) pairs, and foreign keys
/// in both directions (inserts must reference existing rows, deletes must not orphan rows).
pub trait TenantWriter: TenantReader {
    fn insert_plan(&mut self, plan: Plan) -> Result<Plan, StoreError>;
    fn update_plan(&mut self, plan: Plan) -> Result<Plan, StoreError>;
    fn delete_plan(&mut self, id: PlanId) -> Result<(), StoreError>;

    fn insert_company(&mut self, company: Company) -> Result<Company, StoreError>;
    fn update_company(&mut self, company: Company) -> Result<Company, StoreError>;
    fn delete_company(&mut self, id: CompanyId) -> Result<(), StoreError>;

    fn insert_user(&mut self, user: User) -> Result<User, StoreError>;
    fn update_user(&mut self, user: User) -> Result<User, StoreError>;

    fn insert_skill(&mut self, skill: Skill) -> Result<Skill, StoreError>;

    fn insert_candidate(&mut self, candidate: Candidate) -> Result<Candidate, StoreError>;
    fn update_candidate(&mut self, candidate: Candidate) -> Result<Candidate, StoreError>;
    /// Removes the candidate with its skills, experience, and education rows.
    fn delete_candidate(&mut self, id: CandidateId) -> Result<(), StoreError>;
    fn insert_candidate_skill(&mut self, link: CandidateSkill) -> Result<(), StoreError>;
    fn clear_candidate_skills(&mut self, id: CandidateId) -> Result<usize, StoreError>;
    fn insert_experience(&mut self, experience: Experience) -> Result<(), StoreError>;
    fn insert_education(&mut self, education: Education) -> Result<(), StoreError>;

    fn insert_vacancy(&mut self, vacancy: Vacancy) -> Result<Vacancy, StoreError>;
    fn update_vacancy(&mut self, vacancy: Vacancy) -> Result<Vacancy, StoreError>;
    /// Removes the vacancy with its skill rows.
    fn delete_vacancy(&mut self, id: VacancyId) -> Result<(), StoreError>;
    fn insert_vacancy_skill(&mut self, link: VacancySkill) -> Result<(), StoreError>;
    fn clear_vacancy_skills(&mut self, id: VacancyId) -> Result<usize, StoreError>;

    fn insert_application(&mut self, application: Application)
        -> Result<Application, StoreError>;
    fn update_application(&mut self, application: Application)
        -> Result<Application, StoreError>;
    fn delete_application(&mut self, id: ApplicationId) -> Result<(), StoreError>;
}

/// Transactional handle injected into every service.
pub trait TenantStore: Send + Sync {
    /// Run `op` against one consistent snapshot.
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>;

    /// Run `op` as one serializable transaction. Writes become visible only if `op`
    /// returns `Ok`; an `Err` discards every write `op` performed.
    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>;
}
