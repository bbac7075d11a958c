//! Create, update, and delete for the quota-bound tenant resources: candidates, vacancies,
//! and users.
//!
//! Every create runs the company lookup, the quota check, the uniqueness checks, and all of
//! its inserts (including skill, experience, and education rows) in one store transaction.
//! Concurrent creates for the same tenant therefore serialize and can never push the row
//! count past the plan limit. Deletes fall back to a status flip whenever applications still
//! reference the row.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::Utc;
use tracing::info;

use super::domain::{
    Candidate, CandidateId, CandidateSkill, CandidateStatus, CandidateWithRelations, CompanyId,
    CompanyStatus, Education, Experience, ResourceKind, SkillId, User, UserId, UserStatus,
    UserView, Vacancy, VacancyId, VacancySkill, VacancyStatus, VacancyWithRelations,
};
use super::error::ServiceError;
use super::payloads::{
    CandidateUpdate, NewCandidate, NewUser, NewVacancy, SkillAssignment, UserUpdate,
    VacancyUpdate,
};
use super::quota::check_quota;
use super::store::{
    ApplicationFilter, CandidateFilter, TenantReader, TenantStore, UserFilter, VacancyFilter,
};
use super::validation::{normalize_email, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    HardDeleted,
    SoftDeleted {
        status: &'static str,
        dependents: u64,
        dependent_label: &'static str,
    },
}

/// Result of a delete request; the message is what the API returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub entity: &'static str,
    pub id: String,
    pub outcome: RemovalOutcome,
}

impl RemovalReport {
    pub fn hard(entity: &'static str, id: impl ToString) -> Self {
        Self {
            entity,
            id: id.to_string(),
            outcome: RemovalOutcome::HardDeleted,
        }
    }

    pub fn soft(
        entity: &'static str,
        id: impl ToString,
        status: &'static str,
        dependents: u64,
        dependent_label: &'static str,
    ) -> Self {
        Self {
            entity,
            id: id.to_string(),
            outcome: RemovalOutcome::SoftDeleted {
                status,
                dependents,
                dependent_label,
            },
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self.outcome, RemovalOutcome::SoftDeleted { .. })
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            RemovalOutcome::HardDeleted => format!("{} {} deleted", self.entity, self.id),
            RemovalOutcome::SoftDeleted {
                status,
                dependents: 0,
                ..
            } => format!("{} {} marked {}", self.entity, self.id, status),
            RemovalOutcome::SoftDeleted {
                status,
                dependents,
                dependent_label,
            } => format!(
                "{} {} has {} {}; marked {} to preserve them",
                self.entity, self.id, dependents, dependent_label, status
            ),
        }
    }

    fn log(&self) {
        match &self.outcome {
            RemovalOutcome::HardDeleted => {
                info!(entity = self.entity, id = %self.id, "hard deleted");
            }
            RemovalOutcome::SoftDeleted {
                status, dependents, ..
            } => {
                info!(
                    entity = self.entity,
                    id = %self.id,
                    status = *status,
                    dependents = *dependents,
                    "soft deleted"
                );
            }
        }
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::PasswordHash(err.to_string()))
}

pub(crate) fn ensure_company<R>(reader: &R, id: CompanyId) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    let company = reader
        .company(id)?
        .ok_or_else(|| ServiceError::not_found("company", id))?;
    if company.status == CompanyStatus::Inactive {
        return Err(ServiceError::Conflict(format!(
            "company {id} is INACTIVE; reactivate it before adding records"
        )));
    }
    Ok(())
}

fn ensure_skill<R>(reader: &R, id: SkillId) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    reader
        .skill(id)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::not_found("skill", id))
}

fn ensure_candidate_email_free<R>(
    reader: &R,
    email: &str,
    except: Option<CandidateId>,
) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    let filter = CandidateFilter {
        email: Some(email.to_string()),
        ..CandidateFilter::default()
    };
    let taken = reader.candidates(&filter)?.into_iter().any(|candidate| {
        candidate.status != CandidateStatus::Inactive && Some(candidate.id) != except
    });
    if taken {
        return Err(ServiceError::Conflict(format!(
            "a candidate with email {email} already exists"
        )));
    }
    Ok(())
}

fn ensure_user_email_free<R>(
    reader: &R,
    email: &str,
    except: Option<UserId>,
) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    let filter = UserFilter {
        email: Some(email.to_string()),
        ..UserFilter::default()
    };
    let taken = reader
        .users(&filter)?
        .into_iter()
        .any(|user| Some(user.id) != except);
    if taken {
        return Err(ServiceError::Conflict(format!(
            "a user with email {email} already exists"
        )));
    }
    Ok(())
}

/// Candidate plus skills, experience, education, and applications.
pub fn load_candidate<R>(reader: &R, id: CandidateId) -> Result<CandidateWithRelations, ServiceError>
where
    R: TenantReader + ?Sized,
{
    let candidate = reader
        .candidate(id)?
        .ok_or_else(|| ServiceError::not_found("candidate", id))?;
    Ok(CandidateWithRelations {
        skills: reader.candidate_skills(id)?,
        experience: reader.experience(id)?,
        education: reader.education(id)?,
        applications: reader.applications(&ApplicationFilter::for_candidate(id))?,
        candidate,
    })
}

/// Vacancy plus required skills and applications.
pub fn load_vacancy<R>(reader: &R, id: VacancyId) -> Result<VacancyWithRelations, ServiceError>
where
    R: TenantReader + ?Sized,
{
    let vacancy = reader
        .vacancy(id)?
        .ok_or_else(|| ServiceError::not_found("vacancy", id))?;
    Ok(VacancyWithRelations {
        skills: reader.vacancy_skills(id)?,
        applications: reader.applications(&ApplicationFilter::for_vacancy(id))?,
        vacancy,
    })
}

fn check_transition<T: Copy + PartialEq>(
    entity: &'static str,
    from: T,
    to: T,
    allowed: impl Fn(T, T) -> bool,
    label: impl Fn(T) -> &'static str,
) -> Result<(), ValidationError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ValidationError::Transition {
            entity,
            from: label(from),
            to: label(to),
        })
    }
}

/// Row addressed by a generic removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    User(UserId),
    Candidate(CandidateId),
    Vacancy(VacancyId),
}

impl ResourceRef {
    pub fn kind(self) -> ResourceKind {
        match self {
            Self::User(_) => ResourceKind::Users,
            Self::Candidate(_) => ResourceKind::Candidates,
            Self::Vacancy(_) => ResourceKind::Vacancies,
        }
    }
}

/// Lifecycle operations for candidates, vacancies, and users.
pub struct ResourceLifecycleManager<S> {
    store: Arc<S>,
}

impl<S> ResourceLifecycleManager<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn remove(&self, target: ResourceRef) -> Result<RemovalReport, ServiceError> {
        match target {
            ResourceRef::User(id) => self.remove_user(id),
            ResourceRef::Candidate(id) => self.remove_candidate(id),
            ResourceRef::Vacancy(id) => self.remove_vacancy(id),
        }
    }

    pub fn create_candidate(
        &self,
        payload: NewCandidate,
    ) -> Result<CandidateWithRelations, ServiceError> {
        payload.validate()?;
        let email = normalize_email(&payload.email);
        let now = Utc::now();
        let id = CandidateId::generate();

        let created = self.store.write(|tx| {
            ensure_company(&*tx, payload.company_id)?;
            check_quota(&*tx, ResourceKind::Candidates, payload.company_id)?
                .into_result(ResourceKind::Candidates)?;
            ensure_candidate_email_free(&*tx, &email, None)?;

            tx.insert_candidate(Candidate {
                id,
                company_id: payload.company_id,
                name: payload.name.trim().to_string(),
                email: email.clone(),
                phone: payload.phone.clone(),
                state: payload.state.clone(),
                status: CandidateStatus::Active,
                created_at: now,
                updated_at: now,
            })?;
            for skill_id in &payload.skill_ids {
                ensure_skill(&*tx, *skill_id)?;
                tx.insert_candidate_skill(CandidateSkill {
                    candidate_id: id,
                    skill_id: *skill_id,
                })?;
            }
            for experience in &payload.experience {
                tx.insert_experience(Experience {
                    candidate_id: id,
                    company: experience.company.trim().to_string(),
                    title: experience.title.trim().to_string(),
                    start_date: experience.start_date,
                    end_date: experience.end_date,
                })?;
            }
            for education in &payload.education {
                tx.insert_education(Education {
                    candidate_id: id,
                    institution: education.institution.trim().to_string(),
                    degree: education.degree.trim().to_string(),
                    field: education.field.clone(),
                    graduation_year: education.graduation_year,
                })?;
            }
            load_candidate(&*tx, id)
        })?;

        info!(candidate = %id, company = %payload.company_id, "candidate created");
        Ok(created)
    }

    pub fn candidate_with_relations(
        &self,
        id: CandidateId,
    ) -> Result<CandidateWithRelations, ServiceError> {
        self.store.read(|tx| load_candidate(tx, id))
    }

    pub fn candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, ServiceError> {
        self.store
            .read(|tx| tx.candidates(filter).map_err(ServiceError::from))
    }

    pub fn update_candidate(
        &self,
        id: CandidateId,
        payload: CandidateUpdate,
    ) -> Result<Candidate, ServiceError> {
        payload.validate()?;

        self.store.write(|tx| {
            let mut candidate = tx
                .candidate(id)?
                .ok_or_else(|| ServiceError::not_found("candidate", id))?;

            let was_inactive = candidate.status == CandidateStatus::Inactive;
            if let Some(status) = payload.status {
                check_transition(
                    "candidate",
                    candidate.status,
                    status,
                    CandidateStatus::can_transition_to,
                    CandidateStatus::label,
                )?;
                candidate.status = status;
            }
            let mut email_changed = false;
            if let Some(email) = payload.email.as_deref().map(normalize_email) {
                if email != candidate.email {
                    candidate.email = email;
                    email_changed = true;
                }
            }
            // Inactive rows do not hold their email, so reactivation must claim it again.
            let reactivated = was_inactive && candidate.status != CandidateStatus::Inactive;
            if (email_changed || reactivated) && candidate.status != CandidateStatus::Inactive {
                ensure_candidate_email_free(&*tx, &candidate.email, Some(id))?;
            }
            if let Some(name) = &payload.name {
                candidate.name = name.trim().to_string();
            }
            if payload.phone.is_some() {
                candidate.phone = payload.phone.clone();
            }
            if payload.state.is_some() {
                candidate.state = payload.state.clone();
            }
            candidate.updated_at = Utc::now();

            Ok(tx.update_candidate(candidate)?)
        })
    }

    /// Replace the candidate's skill set: all existing rows go, then the given ids are
    /// inserted. A repeated id in `assignment` violates the pair constraint and aborts the
    /// whole replacement.
    pub fn update_candidate_skills(
        &self,
        id: CandidateId,
        assignment: SkillAssignment,
    ) -> Result<CandidateWithRelations, ServiceError> {
        self.store.write(|tx| {
            if tx.candidate(id)?.is_none() {
                return Err(ServiceError::not_found("candidate", id));
            }
            tx.clear_candidate_skills(id)?;
            for skill_id in &assignment.skill_ids {
                ensure_skill(&*tx, *skill_id)?;
                tx.insert_candidate_skill(CandidateSkill {
                    candidate_id: id,
                    skill_id: *skill_id,
                })?;
            }
            load_candidate(&*tx, id)
        })
    }

    pub fn remove_candidate(&self, id: CandidateId) -> Result<RemovalReport, ServiceError> {
        let report = self.store.write(|tx| {
            let mut candidate = tx
                .candidate(id)?
                .ok_or_else(|| ServiceError::not_found("candidate", id))?;
            let dependents = tx.count_applications(&ApplicationFilter::for_candidate(id))?;

            if dependents > 0 {
                candidate.status = CandidateStatus::Inactive;
                candidate.updated_at = Utc::now();
                tx.update_candidate(candidate)?;
                return Ok(RemovalReport::soft(
                    "candidate",
                    id,
                    CandidateStatus::Inactive.label(),
                    dependents,
                    "applications",
                ));
            }

            tx.delete_candidate(id)?;
            Ok::<_, ServiceError>(RemovalReport::hard("candidate", id))
        })?;

        report.log();
        Ok(report)
    }

    pub fn create_vacancy(&self, payload: NewVacancy) -> Result<VacancyWithRelations, ServiceError> {
        payload.validate()?;
        let now = Utc::now();
        let id = VacancyId::generate();

        let created = self.store.write(|tx| {
            ensure_company(&*tx, payload.company_id)?;
            check_quota(&*tx, ResourceKind::Vacancies, payload.company_id)?
                .into_result(ResourceKind::Vacancies)?;

            tx.insert_vacancy(Vacancy {
                id,
                company_id: payload.company_id,
                title: payload.title.trim().to_string(),
                description: payload.description.trim().to_string(),
                location: payload.location.clone(),
                status: payload.status.unwrap_or(VacancyStatus::Draft),
                created_at: now,
                updated_at: now,
            })?;
            for skill_id in &payload.skill_ids {
                ensure_skill(&*tx, *skill_id)?;
                tx.insert_vacancy_skill(VacancySkill {
                    vacancy_id: id,
                    skill_id: *skill_id,
                })?;
            }
            load_vacancy(&*tx, id)
        })?;

        info!(vacancy = %id, company = %payload.company_id, "vacancy created");
        Ok(created)
    }

    pub fn vacancy_with_relations(
        &self,
        id: VacancyId,
    ) -> Result<VacancyWithRelations, ServiceError> {
        self.store.read(|tx| load_vacancy(tx, id))
    }

    pub fn vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, ServiceError> {
        self.store
            .read(|tx| tx.vacancies(filter).map_err(ServiceError::from))
    }

    pub fn update_vacancy(
        &self,
        id: VacancyId,
        payload: VacancyUpdate,
    ) -> Result<Vacancy, ServiceError> {
        payload.validate()?;

        self.store.write(|tx| {
            let mut vacancy = tx
                .vacancy(id)?
                .ok_or_else(|| ServiceError::not_found("vacancy", id))?;

            if let Some(status) = payload.status {
                check_transition(
                    "vacancy",
                    vacancy.status,
                    status,
                    VacancyStatus::can_transition_to,
                    VacancyStatus::label,
                )?;
                vacancy.status = status;
            }
            if let Some(title) = &payload.title {
                vacancy.title = title.trim().to_string();
            }
            if let Some(description) = &payload.description {
                vacancy.description = description.trim().to_string();
            }
            if payload.location.is_some() {
                vacancy.location = payload.location.clone();
            }
            vacancy.updated_at = Utc::now();

            Ok(tx.update_vacancy(vacancy)?)
        })
    }

    /// Same replacement semantics as [`Self::update_candidate_skills`].
    pub fn update_vacancy_skills(
        &self,
        id: VacancyId,
        assignment: SkillAssignment,
    ) -> Result<VacancyWithRelations, ServiceError> {
        self.store.write(|tx| {
            if tx.vacancy(id)?.is_none() {
                return Err(ServiceError::not_found("vacancy", id));
            }
            tx.clear_vacancy_skills(id)?;
            for skill_id in &assignment.skill_ids {
                ensure_skill(&*tx, *skill_id)?;
                tx.insert_vacancy_skill(VacancySkill {
                    vacancy_id: id,
                    skill_id: *skill_id,
                })?;
            }
            load_vacancy(&*tx, id)
        })
    }

    /// Vacancies with applications are closed rather than removed. One that is already
    /// CLOSED or CANCELLED keeps its status.
    pub fn remove_vacancy(&self, id: VacancyId) -> Result<RemovalReport, ServiceError> {
        let report = self.store.write(|tx| {
            let mut vacancy = tx
                .vacancy(id)?
                .ok_or_else(|| ServiceError::not_found("vacancy", id))?;
            let dependents = tx.count_applications(&ApplicationFilter::for_vacancy(id))?;

            if dependents > 0 {
                if !matches!(vacancy.status, VacancyStatus::Closed | VacancyStatus::Cancelled) {
                    vacancy.status = VacancyStatus::Closed;
                    vacancy.updated_at = Utc::now();
                }
                let status = vacancy.status.label();
                tx.update_vacancy(vacancy)?;
                return Ok(RemovalReport::soft(
                    "vacancy",
                    id,
                    status,
                    dependents,
                    "applications",
                ));
            }

            tx.delete_vacancy(id)?;
            Ok::<_, ServiceError>(RemovalReport::hard("vacancy", id))
        })?;

        report.log();
        Ok(report)
    }

    pub fn create_user(&self, payload: NewUser) -> Result<UserView, ServiceError> {
        payload.validate()?;
        let email = normalize_email(&payload.email);
        let password_hash = hash_password(&payload.password)?;
        let now = Utc::now();
        let id = UserId::generate();

        let created = self.store.write(|tx| {
            if let Some(company_id) = payload.company_id {
                ensure_company(&*tx, company_id)?;
                check_quota(&*tx, ResourceKind::Users, company_id)?
                    .into_result(ResourceKind::Users)?;
            }
            ensure_user_email_free(&*tx, &email, None)?;

            Ok::<_, ServiceError>(tx.insert_user(User {
                id,
                name: payload.name.trim().to_string(),
                email: email.clone(),
                password_hash,
                role: payload.role,
                status: UserStatus::Active,
                company_id: payload.company_id,
                created_at: now,
                updated_at: now,
            })?)
        })?;

        info!(user = %id, role = created.role.label(), "user created");
        Ok(created.view())
    }

    pub fn user(&self, id: UserId) -> Result<UserView, ServiceError> {
        self.store.read(|tx| {
            tx.user(id)?
                .map(|user| user.view())
                .ok_or_else(|| ServiceError::not_found("user", id))
        })
    }

    pub fn users(&self, filter: &UserFilter) -> Result<Vec<UserView>, ServiceError> {
        self.store.read(|tx| {
            Ok(tx
                .users(filter)?
                .iter()
                .map(User::view)
                .collect::<Vec<_>>())
        })
    }

    pub fn update_user(&self, id: UserId, payload: UserUpdate) -> Result<UserView, ServiceError> {
        payload.validate()?;
        let password_hash = payload
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let updated = self.store.write(|tx| {
            let mut user = tx
                .user(id)?
                .ok_or_else(|| ServiceError::not_found("user", id))?;

            if let Some(email) = payload.email.as_deref().map(normalize_email) {
                if email != user.email {
                    ensure_user_email_free(&*tx, &email, Some(id))?;
                    user.email = email;
                }
            }
            if let Some(name) = &payload.name {
                user.name = name.trim().to_string();
            }
            if let Some(role) = payload.role {
                user.role = role;
            }
            if let Some(status) = payload.status {
                user.status = status;
            }
            if let Some(hash) = password_hash {
                user.password_hash = hash;
            }
            user.updated_at = Utc::now();

            Ok::<_, ServiceError>(tx.update_user(user)?)
        })?;

        Ok(updated.view())
    }

    /// Users are never hard-deleted; removal always deactivates.
    pub fn remove_user(&self, id: UserId) -> Result<RemovalReport, ServiceError> {
        let report = self.store.write(|tx| {
            let mut user = tx
                .user(id)?
                .ok_or_else(|| ServiceError::not_found("user", id))?;
            user.status = UserStatus::Inactive;
            user.updated_at = Utc::now();
            tx.update_user(user)?;
            Ok::<_, ServiceError>(RemovalReport::soft(
                "user",
                id,
                "INACTIVE",
                0,
                "dependents",
            ))
        })?;

        report.log();
        Ok(report)
    }
}
