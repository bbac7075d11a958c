//! Candidate applications to vacancies.
//!
//! Applications are the dependents that decide between soft and hard deletes elsewhere, so
//! creating one is guarded: both sides must belong to the same tenant, the vacancy must be
//! open, and the candidate must still be available.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateStatus, VacancyStatus,
};
use super::error::ServiceError;
use super::lifecycle::RemovalReport;
use super::payloads::{ApplicationUpdate, NewApplication};
use super::store::{ApplicationFilter, TenantStore};
use super::validation::{Validate, ValidationError};

pub struct ApplicationService<S> {
    store: Arc<S>,
}

impl<S> ApplicationService<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, payload: NewApplication) -> Result<Application, ServiceError> {
        payload.validate()?;
        let now = Utc::now();

        let application = self.store.write(|tx| {
            let mut candidate = tx
                .candidate(payload.candidate_id)?
                .ok_or_else(|| ServiceError::not_found("candidate", payload.candidate_id))?;
            let vacancy = tx
                .vacancy(payload.vacancy_id)?
                .ok_or_else(|| ServiceError::not_found("vacancy", payload.vacancy_id))?;

            if candidate.company_id != vacancy.company_id {
                return Err(ValidationError::invalid(
                    "vacancyId",
                    "candidate and vacancy belong to different companies",
                )
                .into());
            }
            if vacancy.status != VacancyStatus::Open {
                return Err(ServiceError::Conflict(format!(
                    "vacancy {} is {} and does not accept applications",
                    vacancy.id,
                    vacancy.status.label()
                )));
            }
            if matches!(
                candidate.status,
                CandidateStatus::Inactive | CandidateStatus::Hired
            ) {
                return Err(ServiceError::Conflict(format!(
                    "candidate {} is {} and cannot apply",
                    candidate.id,
                    candidate.status.label()
                )));
            }

            let application = tx.insert_application(Application {
                id: ApplicationId::generate(),
                candidate_id: candidate.id,
                vacancy_id: vacancy.id,
                status: ApplicationStatus::Pending,
                notes: payload.notes.clone(),
                created_at: now,
                updated_at: now,
            })?;

            if candidate.status == CandidateStatus::Active {
                candidate.status = CandidateStatus::InProcess;
                candidate.updated_at = now;
                tx.update_candidate(candidate)?;
            }
            Ok(application)
        })?;

        info!(
            application = %application.id,
            candidate = %application.candidate_id,
            vacancy = %application.vacancy_id,
            "application created"
        );
        Ok(application)
    }

    pub fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, ServiceError> {
        self.store
            .read(|tx| tx.applications(filter).map_err(ServiceError::from))
    }

    pub fn get(&self, id: ApplicationId) -> Result<Application, ServiceError> {
        self.store.read(|tx| {
            tx.application(id)?
                .ok_or_else(|| ServiceError::not_found("application", id))
        })
    }

    /// Advances the pipeline. Accepting an offer marks the candidate HIRED in the same
    /// transaction.
    pub fn update(
        &self,
        id: ApplicationId,
        payload: ApplicationUpdate,
    ) -> Result<Application, ServiceError> {
        payload.validate()?;

        let application = self.store.write(|tx| {
            let mut application = tx
                .application(id)?
                .ok_or_else(|| ServiceError::not_found("application", id))?;
            let now = Utc::now();

            if let Some(status) = payload.status {
                if !application.status.can_transition_to(status) {
                    return Err(ValidationError::Transition {
                        entity: "application",
                        from: application.status.label(),
                        to: status.label(),
                    }
                    .into());
                }
                if status == ApplicationStatus::Accepted
                    && application.status != ApplicationStatus::Accepted
                {
                    let mut candidate = tx.candidate(application.candidate_id)?.ok_or_else(
                        || ServiceError::not_found("candidate", application.candidate_id),
                    )?;
                    candidate.status = CandidateStatus::Hired;
                    candidate.updated_at = now;
                    tx.update_candidate(candidate)?;
                }
                application.status = status;
            }
            if payload.notes.is_some() {
                application.notes = payload.notes.clone();
            }
            application.updated_at = now;

            Ok::<_, ServiceError>(tx.update_application(application)?)
        })?;

        info!(
            application = %application.id,
            status = application.status.label(),
            "application updated"
        );
        Ok(application)
    }

    pub fn remove(&self, id: ApplicationId) -> Result<RemovalReport, ServiceError> {
        self.store.write(|tx| {
            if tx.application(id)?.is_none() {
                return Err(ServiceError::not_found("application", id));
            }
            tx.delete_application(id)?;
            info!(application = %id, "application deleted");
            Ok(RemovalReport::hard("application", id))
        })
    }
}
