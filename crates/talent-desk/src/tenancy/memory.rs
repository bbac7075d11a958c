//! In-process tenant store.
//!
//! All tables live behind one mutex. A write transaction clones the table set, applies the
//! closure to the copy, and swaps the copy in only on success, so every transaction is
//! serializable and all-or-nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, Candidate, CandidateId, CandidateSkill, Company, CompanyId,
    Education, Experience, Plan, PlanId, ResourceKind, Skill, SkillId, User, UserId, Vacancy,
    VacancyId, VacancySkill,
};
use super::store::{
    ApplicationFilter, CandidateFilter, CompanyFilter, StoreError, TenantReader, TenantStore,
    TenantWriter, UserFilter, VacancyFilter,
};

/// Serializable dump of every table, used for fixtures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantSnapshot {
    pub plans: Vec<Plan>,
    pub companies: Vec<Company>,
    pub users: Vec<User>,
    pub skills: Vec<Skill>,
    pub candidates: Vec<Candidate>,
    pub candidate_skills: Vec<CandidateSkill>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub vacancies: Vec<Vacancy>,
    pub vacancy_skills: Vec<VacancySkill>,
    pub applications: Vec<Application>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("fixtures are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fixtures violate store constraints: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store, enforcing the same constraints as regular writes.
    pub fn from_snapshot(snapshot: TenantSnapshot) -> Result<Self, StoreError> {
        let mut tables = Tables::default();
        for plan in snapshot.plans {
            tables.insert_plan(plan)?;
        }
        for company in snapshot.companies {
            tables.insert_company(company)?;
        }
        for user in snapshot.users {
            tables.insert_user(user)?;
        }
        for skill in snapshot.skills {
            tables.insert_skill(skill)?;
        }
        for candidate in snapshot.candidates {
            tables.insert_candidate(candidate)?;
        }
        for link in snapshot.candidate_skills {
            tables.insert_candidate_skill(link)?;
        }
        for experience in snapshot.experience {
            tables.insert_experience(experience)?;
        }
        for education in snapshot.education {
            tables.insert_education(education)?;
        }
        for vacancy in snapshot.vacancies {
            tables.insert_vacancy(vacancy)?;
        }
        for link in snapshot.vacancy_skills {
            tables.insert_vacancy_skill(link)?;
        }
        for application in snapshot.applications {
            tables.insert_application(application)?;
        }

        Ok(Self {
            tables: Mutex::new(tables),
        })
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, FixtureError> {
        let snapshot: TenantSnapshot = serde_json::from_reader(reader)?;
        Ok(Self::from_snapshot(snapshot)?)
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self, FixtureError> {
        let file = File::open(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_reader(BufReader::new(file))
    }

    pub fn snapshot(&self) -> Result<TenantSnapshot, StoreError> {
        let tables = self.lock()?;
        Ok(TenantSnapshot {
            plans: tables.plans.values().cloned().collect(),
            companies: tables.companies.values().cloned().collect(),
            users: tables.users.values().cloned().collect(),
            skills: tables.skills.values().cloned().collect(),
            candidates: tables.candidates.values().cloned().collect(),
            candidate_skills: tables
                .candidate_skills
                .iter()
                .map(|(candidate_id, skill_id)| CandidateSkill {
                    candidate_id: *candidate_id,
                    skill_id: *skill_id,
                })
                .collect(),
            experience: tables.experience.clone(),
            education: tables.education.clone(),
            vacancies: tables.vacancies.values().cloned().collect(),
            vacancy_skills: tables
                .vacancy_skills
                .iter()
                .map(|(vacancy_id, skill_id)| VacancySkill {
                    vacancy_id: *vacancy_id,
                    skill_id: *skill_id,
                })
                .collect(),
            applications: tables.applications.values().cloned().collect(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("tenant store mutex poisoned".to_string()))
    }
}

impl TenantStore for MemoryStore {
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn TenantReader) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tables = self.lock()?;
        op(&*tables)
    }

    fn write<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn TenantWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tables = self.lock()?;
        let mut working = tables.clone();
        let output = op(&mut working)?;
        *tables = working;
        Ok(output)
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    plans: BTreeMap<PlanId, Plan>,
    companies: BTreeMap<CompanyId, Company>,
    users: BTreeMap<UserId, User>,
    skills: BTreeMap<SkillId, Skill>,
    candidates: BTreeMap<CandidateId, Candidate>,
    candidate_skills: BTreeSet<(CandidateId, SkillId)>,
    experience: Vec<Experience>,
    education: Vec<Education>,
    vacancies: BTreeMap<VacancyId, Vacancy>,
    vacancy_skills: BTreeSet<(VacancyId, SkillId)>,
    applications: BTreeMap<ApplicationId, Application>,
}

fn newest_first<T, K>(mut rows: Vec<T>, key: K) -> Vec<T>
where
    K: Fn(&T) -> (DateTime<Utc>, uuid::Uuid),
{
    rows.sort_by(|a, b| {
        let (a_at, a_id) = key(a);
        let (b_at, b_id) = key(b);
        b_at.cmp(&a_at).then(a_id.cmp(&b_id))
    });
    rows
}

fn same_email(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

fn missing(table: &'static str, id: impl ToString) -> StoreError {
    StoreError::MissingRow {
        table,
        id: id.to_string(),
    }
}

fn sorted_skills<'a>(tables: &Tables, ids: impl Iterator<Item = &'a SkillId>) -> Vec<Skill> {
    let mut skills: Vec<Skill> = ids
        .filter_map(|id| tables.skills.get(id).cloned())
        .collect();
    skills.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    skills
}

impl Tables {
    fn application_matches(&self, application: &Application, filter: &ApplicationFilter) -> bool {
        if filter
            .candidate_id
            .is_some_and(|id| id != application.candidate_id)
        {
            return false;
        }
        if filter
            .vacancy_id
            .is_some_and(|id| id != application.vacancy_id)
        {
            return false;
        }
        if filter.status.is_some_and(|status| status != application.status) {
            return false;
        }
        match filter.company_id {
            Some(company_id) => self
                .vacancies
                .get(&application.vacancy_id)
                .is_some_and(|vacancy| vacancy.company_id == company_id),
            None => true,
        }
    }

    fn check_active_plan_type(&self, plan: &Plan) -> Result<(), StoreError> {
        let clash = plan.is_active
            && self.plans.values().any(|other| {
                other.id != plan.id && other.is_active && other.plan_type == plan.plan_type
            });
        if clash {
            return Err(StoreError::UniqueViolation("plans_active_type_key"));
        }
        Ok(())
    }

    fn check_company_refs(&self, company: &Company) -> Result<(), StoreError> {
        if !self.plans.contains_key(&company.plan_id) {
            return Err(StoreError::ForeignKeyViolation("companies_plan_id_fkey"));
        }
        let domain_taken = self.companies.values().any(|other| {
            other.id != company.id && other.domain.eq_ignore_ascii_case(&company.domain)
        });
        if domain_taken {
            return Err(StoreError::UniqueViolation("companies_domain_key"));
        }
        Ok(())
    }

    fn check_user_refs(&self, user: &User) -> Result<(), StoreError> {
        if let Some(company_id) = user.company_id {
            if !self.companies.contains_key(&company_id) {
                return Err(StoreError::ForeignKeyViolation("users_company_id_fkey"));
            }
        }
        let email_taken = self
            .users
            .values()
            .any(|other| other.id != user.id && same_email(&other.email, &user.email));
        if email_taken {
            return Err(StoreError::UniqueViolation("users_email_key"));
        }
        Ok(())
    }

    fn require_company(&self, id: CompanyId, constraint: &'static str) -> Result<(), StoreError> {
        if self.companies.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation(constraint))
        }
    }
}

impl TenantReader for Tables {
    fn plan(&self, id: PlanId) -> Result<Option<Plan>, StoreError> {
        Ok(self.plans.get(&id).cloned())
    }

    fn plans(&self) -> Result<Vec<Plan>, StoreError> {
        let rows: Vec<Plan> = self.plans.values().cloned().collect();
        Ok(newest_first(rows, |plan: &Plan| (plan.created_at, plan.id.0)))
    }

    fn count_companies_on_plan(&self, id: PlanId) -> Result<u64, StoreError> {
        Ok(self
            .companies
            .values()
            .filter(|company| company.plan_id == id)
            .count() as u64)
    }

    fn company(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.companies.get(&id).cloned())
    }

    fn companies(&self, filter: &CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let rows: Vec<Company> = self
            .companies
            .values()
            .filter(|company| filter.status.map_or(true, |status| company.status == status))
            .filter(|company| filter.plan_id.map_or(true, |plan| company.plan_id == plan))
            .cloned()
            .collect();
        Ok(newest_first(rows, |company: &Company| {
            (company.created_at, company.id.0)
        }))
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).cloned())
    }

    fn users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let rows: Vec<User> = self
            .users
            .values()
            .filter(|user| {
                filter
                    .company_id
                    .map_or(true, |company| user.company_id == Some(company))
            })
            .filter(|user| filter.status.map_or(true, |status| user.status == status))
            .filter(|user| {
                filter
                    .email
                    .as_deref()
                    .map_or(true, |email| same_email(&user.email, email))
            })
            .cloned()
            .collect();
        Ok(newest_first(rows, |user: &User| (user.created_at, user.id.0)))
    }

    fn skill(&self, id: SkillId) -> Result<Option<Skill>, StoreError> {
        Ok(self.skills.get(&id).cloned())
    }

    fn skills(&self) -> Result<Vec<Skill>, StoreError> {
        Ok(sorted_skills(self, self.skills.keys()))
    }

    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        Ok(self.candidates.get(&id).cloned())
    }

    fn candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, StoreError> {
        let rows: Vec<Candidate> = self
            .candidates
            .values()
            .filter(|candidate| {
                filter
                    .company_id
                    .map_or(true, |company| candidate.company_id == company)
            })
            .filter(|candidate| filter.status.map_or(true, |status| candidate.status == status))
            .filter(|candidate| {
                filter
                    .email
                    .as_deref()
                    .map_or(true, |email| same_email(&candidate.email, email))
            })
            .cloned()
            .collect();
        Ok(newest_first(rows, |candidate: &Candidate| {
            (candidate.created_at, candidate.id.0)
        }))
    }

    fn candidate_skills(&self, id: CandidateId) -> Result<Vec<Skill>, StoreError> {
        let ids = self
            .candidate_skills
            .iter()
            .filter(|(candidate_id, _)| *candidate_id == id)
            .map(|(_, skill_id)| skill_id);
        Ok(sorted_skills(self, ids))
    }

    fn experience(&self, id: CandidateId) -> Result<Vec<Experience>, StoreError> {
        let mut rows: Vec<Experience> = self
            .experience
            .iter()
            .filter(|row| row.candidate_id == id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    fn education(&self, id: CandidateId) -> Result<Vec<Education>, StoreError> {
        Ok(self
            .education
            .iter()
            .filter(|row| row.candidate_id == id)
            .cloned()
            .collect())
    }

    fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, StoreError> {
        Ok(self.vacancies.get(&id).cloned())
    }

    fn vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, StoreError> {
        let rows: Vec<Vacancy> = self
            .vacancies
            .values()
            .filter(|vacancy| {
                filter
                    .company_id
                    .map_or(true, |company| vacancy.company_id == company)
            })
            .filter(|vacancy| filter.status.map_or(true, |status| vacancy.status == status))
            .cloned()
            .collect();
        Ok(newest_first(rows, |vacancy: &Vacancy| {
            (vacancy.created_at, vacancy.id.0)
        }))
    }

    fn vacancy_skills(&self, id: VacancyId) -> Result<Vec<Skill>, StoreError> {
        let ids = self
            .vacancy_skills
            .iter()
            .filter(|(vacancy_id, _)| *vacancy_id == id)
            .map(|(_, skill_id)| skill_id);
        Ok(sorted_skills(self, ids))
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.applications.get(&id).cloned())
    }

    fn applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, StoreError> {
        let rows: Vec<Application> = self
            .applications
            .values()
            .filter(|application| self.application_matches(application, filter))
            .cloned()
            .collect();
        Ok(newest_first(rows, |application: &Application| {
            (application.created_at, application.id.0)
        }))
    }

    fn count_resources(&self, kind: ResourceKind, company: CompanyId) -> Result<u64, StoreError> {
        let count = match kind {
            ResourceKind::Users => self
                .users
                .values()
                .filter(|user| user.company_id == Some(company))
                .count(),
            ResourceKind::Candidates => self
                .candidates
                .values()
                .filter(|candidate| candidate.company_id == company)
                .count(),
            ResourceKind::Vacancies => self
                .vacancies
                .values()
                .filter(|vacancy| vacancy.company_id == company)
                .count(),
        };
        Ok(count as u64)
    }

    fn count_applications(&self, filter: &ApplicationFilter) -> Result<u64, StoreError> {
        Ok(self
            .applications
            .values()
            .filter(|application| self.application_matches(application, filter))
            .count() as u64)
    }
}

impl TenantWriter for Tables {
    fn insert_plan(&mut self, plan: Plan) -> Result<Plan, StoreError> {
        if self.plans.contains_key(&plan.id) {
            return Err(StoreError::UniqueViolation("plans_pkey"));
        }
        self.check_active_plan_type(&plan)?;
        self.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    fn update_plan(&mut self, plan: Plan) -> Result<Plan, StoreError> {
        if !self.plans.contains_key(&plan.id) {
            return Err(missing("plans", plan.id));
        }
        self.check_active_plan_type(&plan)?;
        self.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    fn delete_plan(&mut self, id: PlanId) -> Result<(), StoreError> {
        if self.companies.values().any(|company| company.plan_id == id) {
            return Err(StoreError::ForeignKeyViolation("companies_plan_id_fkey"));
        }
        self.plans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("plans", id))
    }

    fn insert_company(&mut self, company: Company) -> Result<Company, StoreError> {
        if self.companies.contains_key(&company.id) {
            return Err(StoreError::UniqueViolation("companies_pkey"));
        }
        self.check_company_refs(&company)?;
        self.companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn update_company(&mut self, company: Company) -> Result<Company, StoreError> {
        if !self.companies.contains_key(&company.id) {
            return Err(missing("companies", company.id));
        }
        self.check_company_refs(&company)?;
        self.companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn delete_company(&mut self, id: CompanyId) -> Result<(), StoreError> {
        if self.users.values().any(|user| user.company_id == Some(id)) {
            return Err(StoreError::ForeignKeyViolation("users_company_id_fkey"));
        }
        if self.candidates.values().any(|row| row.company_id == id) {
            return Err(StoreError::ForeignKeyViolation("candidates_company_id_fkey"));
        }
        if self.vacancies.values().any(|row| row.company_id == id) {
            return Err(StoreError::ForeignKeyViolation("vacancies_company_id_fkey"));
        }
        self.companies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("companies", id))
    }

    fn insert_user(&mut self, user: User) -> Result<User, StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::UniqueViolation("users_pkey"));
        }
        self.check_user_refs(&user)?;
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, user: User) -> Result<User, StoreError> {
        if !self.users.contains_key(&user.id) {
            return Err(missing("users", user.id));
        }
        self.check_user_refs(&user)?;
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_skill(&mut self, skill: Skill) -> Result<Skill, StoreError> {
        let name_taken = self
            .skills
            .values()
            .any(|other| other.name.trim().eq_ignore_ascii_case(skill.name.trim()));
        if self.skills.contains_key(&skill.id) || name_taken {
            return Err(StoreError::UniqueViolation("skills_name_key"));
        }
        self.skills.insert(skill.id, skill.clone());
        Ok(skill)
    }

    fn insert_candidate(&mut self, candidate: Candidate) -> Result<Candidate, StoreError> {
        if self.candidates.contains_key(&candidate.id) {
            return Err(StoreError::UniqueViolation("candidates_pkey"));
        }
        self.require_company(candidate.company_id, "candidates_company_id_fkey")?;
        self.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    fn update_candidate(&mut self, candidate: Candidate) -> Result<Candidate, StoreError> {
        if !self.candidates.contains_key(&candidate.id) {
            return Err(missing("candidates", candidate.id));
        }
        self.require_company(candidate.company_id, "candidates_company_id_fkey")?;
        self.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    fn delete_candidate(&mut self, id: CandidateId) -> Result<(), StoreError> {
        if self
            .applications
            .values()
            .any(|application| application.candidate_id == id)
        {
            return Err(StoreError::ForeignKeyViolation(
                "applications_candidate_id_fkey",
            ));
        }
        self.candidates
            .remove(&id)
            .ok_or_else(|| missing("candidates", id))?;
        self.candidate_skills
            .retain(|(candidate_id, _)| *candidate_id != id);
        self.experience.retain(|row| row.candidate_id != id);
        self.education.retain(|row| row.candidate_id != id);
        Ok(())
    }

    fn insert_candidate_skill(&mut self, link: CandidateSkill) -> Result<(), StoreError> {
        if !self.candidates.contains_key(&link.candidate_id) {
            return Err(StoreError::ForeignKeyViolation(
                "candidate_skills_candidate_id_fkey",
            ));
        }
        if !self.skills.contains_key(&link.skill_id) {
            return Err(StoreError::ForeignKeyViolation(
                "candidate_skills_skill_id_fkey",
            ));
        }
        if !self
            .candidate_skills
            .insert((link.candidate_id, link.skill_id))
        {
            return Err(StoreError::UniqueViolation("candidate_skills_pkey"));
        }
        Ok(())
    }

    fn clear_candidate_skills(&mut self, id: CandidateId) -> Result<usize, StoreError> {
        let before = self.candidate_skills.len();
        self.candidate_skills
            .retain(|(candidate_id, _)| *candidate_id != id);
        Ok(before - self.candidate_skills.len())
    }

    fn insert_experience(&mut self, experience: Experience) -> Result<(), StoreError> {
        if !self.candidates.contains_key(&experience.candidate_id) {
            return Err(StoreError::ForeignKeyViolation(
                "experience_candidate_id_fkey",
            ));
        }
        self.experience.push(experience);
        Ok(())
    }

    fn insert_education(&mut self, education: Education) -> Result<(), StoreError> {
        if !self.candidates.contains_key(&education.candidate_id) {
            return Err(StoreError::ForeignKeyViolation(
                "education_candidate_id_fkey",
            ));
        }
        self.education.push(education);
        Ok(())
    }

    fn insert_vacancy(&mut self, vacancy: Vacancy) -> Result<Vacancy, StoreError> {
        if self.vacancies.contains_key(&vacancy.id) {
            return Err(StoreError::UniqueViolation("vacancies_pkey"));
        }
        self.require_company(vacancy.company_id, "vacancies_company_id_fkey")?;
        self.vacancies.insert(vacancy.id, vacancy.clone());
        Ok(vacancy)
    }

    fn update_vacancy(&mut self, vacancy: Vacancy) -> Result<Vacancy, StoreError> {
        if !self.vacancies.contains_key(&vacancy.id) {
            return Err(missing("vacancies", vacancy.id));
        }
        self.require_company(vacancy.company_id, "vacancies_company_id_fkey")?;
        self.vacancies.insert(vacancy.id, vacancy.clone());
        Ok(vacancy)
    }

    fn delete_vacancy(&mut self, id: VacancyId) -> Result<(), StoreError> {
        if self
            .applications
            .values()
            .any(|application| application.vacancy_id == id)
        {
            return Err(StoreError::ForeignKeyViolation(
                "applications_vacancy_id_fkey",
            ));
        }
        self.vacancies
            .remove(&id)
            .ok_or_else(|| missing("vacancies", id))?;
        self.vacancy_skills.retain(|(vacancy_id, _)| *vacancy_id != id);
        Ok(())
    }

    fn insert_vacancy_skill(&mut self, link: VacancySkill) -> Result<(), StoreError> {
        if !self.vacancies.contains_key(&link.vacancy_id) {
            return Err(StoreError::ForeignKeyViolation(
                "vacancy_skills_vacancy_id_fkey",
            ));
        }
        if !self.skills.contains_key(&link.skill_id) {
            return Err(StoreError::ForeignKeyViolation(
                "vacancy_skills_skill_id_fkey",
            ));
        }
        if !self.vacancy_skills.insert((link.vacancy_id, link.skill_id)) {
            return Err(StoreError::UniqueViolation("vacancy_skills_pkey"));
        }
        Ok(())
    }

    fn clear_vacancy_skills(&mut self, id: VacancyId) -> Result<usize, StoreError> {
        let before = self.vacancy_skills.len();
        self.vacancy_skills.retain(|(vacancy_id, _)| *vacancy_id != id);
        Ok(before - self.vacancy_skills.len())
    }

    fn insert_application(
        &mut self,
        application: Application,
    ) -> Result<Application, StoreError> {
        if !self.candidates.contains_key(&application.candidate_id) {
            return Err(StoreError::ForeignKeyViolation(
                "applications_candidate_id_fkey",
            ));
        }
        if !self.vacancies.contains_key(&application.vacancy_id) {
            return Err(StoreError::ForeignKeyViolation(
                "applications_vacancy_id_fkey",
            ));
        }
        let duplicate = self.applications.values().any(|other| {
            other.candidate_id == application.candidate_id
                && other.vacancy_id == application.vacancy_id
        });
        if self.applications.contains_key(&application.id) || duplicate {
            return Err(StoreError::UniqueViolation(
                "applications_candidate_vacancy_key",
            ));
        }
        self.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn update_application(
        &mut self,
        application: Application,
    ) -> Result<Application, StoreError> {
        if !self.applications.contains_key(&application.id) {
            return Err(missing("applications", application.id));
        }
        self.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn delete_application(&mut self, id: ApplicationId) -> Result<(), StoreError> {
        self.applications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("applications", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::domain::{CandidateStatus, CompanyStatus, PlanType};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn plan() -> Plan {
        Plan {
            id: PlanId::generate(),
            name: "Starter".to_string(),
            plan_type: PlanType::Basic,
            max_users: 2,
            max_candidates: 2,
            max_vacancies: 2,
            price: Decimal::new(4900, 2),
            is_active: true,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn company(plan_id: PlanId) -> Company {
        Company {
            id: CompanyId::generate(),
            name: "Acme".to_string(),
            domain: "acme.io".to_string(),
            sector: None,
            status: CompanyStatus::Active,
            plan_id,
            created_at: at(1),
            updated_at: at(1),
        }
    }

    fn candidate(company_id: CompanyId, day: u32) -> Candidate {
        Candidate {
            id: CandidateId::generate(),
            company_id,
            name: format!("Candidate {day}"),
            email: format!("candidate{day}@example.com"),
            phone: None,
            state: None,
            status: CandidateStatus::Active,
            created_at: at(day),
            updated_at: at(day),
        }
    }

    fn seeded() -> (MemoryStore, Company) {
        let plan = plan();
        let company = company(plan.id);
        let store = MemoryStore::from_snapshot(TenantSnapshot {
            plans: vec![plan],
            companies: vec![company.clone()],
            ..TenantSnapshot::default()
        })
        .expect("snapshot loads");
        (store, company)
    }

    #[test]
    fn failed_write_discards_every_change() {
        let (store, company) = seeded();
        let result: Result<(), StoreError> = store.write(|tx| {
            tx.insert_candidate(candidate(company.id, 2))?;
            tx.insert_candidate_skill(CandidateSkill {
                candidate_id: CandidateId::generate(),
                skill_id: SkillId::generate(),
            })
        });

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
        let count = store
            .read(|tx| tx.count_resources(ResourceKind::Candidates, company.id))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn lists_are_newest_first() {
        let (store, company) = seeded();
        store
            .write(|tx| -> Result<(), StoreError> {
                tx.insert_candidate(candidate(company.id, 3))?;
                tx.insert_candidate(candidate(company.id, 7))?;
                tx.insert_candidate(candidate(company.id, 5))?;
                Ok(())
            })
            .expect("inserts commit");

        let names: Vec<String> = store
            .read(|tx| tx.candidates(&CandidateFilter::default()))
            .expect("list")
            .into_iter()
            .map(|candidate| candidate.name)
            .collect();
        assert_eq!(names, ["Candidate 7", "Candidate 5", "Candidate 3"]);
    }

    #[test]
    fn referenced_rows_cannot_be_deleted() {
        let (store, company) = seeded();
        let plan_id = company.plan_id;
        let result = store.write(|tx| tx.delete_plan(plan_id));
        assert_eq!(
            result,
            Err(StoreError::ForeignKeyViolation("companies_plan_id_fkey"))
        );
    }

    #[test]
    fn second_active_plan_of_a_type_is_rejected() {
        let (store, _) = seeded();
        let result = store.write(|tx| tx.insert_plan(plan()));
        assert_eq!(
            result.map(|_| ()),
            Err(StoreError::UniqueViolation("plans_active_type_key"))
        );
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let (store, company) = seeded();
        store
            .write(|tx| tx.insert_candidate(candidate(company.id, 4)))
            .expect("insert");

        let snapshot = store.snapshot().expect("snapshot");
        let json = serde_json::to_vec(&snapshot).expect("serialize");
        let restored = MemoryStore::from_json_reader(json.as_slice()).expect("reload");
        assert_eq!(restored.snapshot().expect("snapshot"), snapshot);
    }

    #[test]
    fn fixtures_with_dangling_references_are_rejected() {
        let orphan = company(PlanId::generate());
        let result = MemoryStore::from_snapshot(TenantSnapshot {
            companies: vec![orphan],
            ..TenantSnapshot::default()
        });
        assert!(matches!(
            result,
            Err(StoreError::ForeignKeyViolation("companies_plan_id_fkey"))
        ));
    }
}
