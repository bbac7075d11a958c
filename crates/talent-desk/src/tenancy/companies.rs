use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Company, CompanyId, CompanyStatus, PlanId, ResourceKind};
use super::error::ServiceError;
use super::lifecycle::RemovalReport;
use super::payloads::{CompanyUpdate, NewCompany};
use super::quota::{self, QuotaUsage};
use super::store::{CompanyFilter, TenantReader, TenantStore};
use super::validation::{normalize_domain, Validate};

fn ensure_subscribable<R>(reader: &R, plan_id: PlanId) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    let plan = reader
        .plan(plan_id)?
        .ok_or_else(|| ServiceError::not_found("plan", plan_id))?;
    if !plan.is_active {
        return Err(ServiceError::Conflict(format!(
            "plan \"{}\" is not active",
            plan.name
        )));
    }
    Ok(())
}

/// Tenant lifecycle.
pub struct CompanyService<S> {
    store: Arc<S>,
}

impl<S> CompanyService<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// New tenants start in `TRIAL` unless a status is given.
    pub fn create(&self, payload: NewCompany) -> Result<Company, ServiceError> {
        payload.validate()?;
        let now = Utc::now();

        let company = self.store.write(|tx| {
            ensure_subscribable(&*tx, payload.plan_id)?;
            Ok::<_, ServiceError>(tx.insert_company(Company {
                id: CompanyId::generate(),
                name: payload.name.trim().to_string(),
                domain: normalize_domain(&payload.domain),
                sector: payload.sector.clone(),
                status: payload.status.unwrap_or(CompanyStatus::Trial),
                plan_id: payload.plan_id,
                created_at: now,
                updated_at: now,
            })?)
        })?;

        info!(company = %company.id, domain = %company.domain, "company created");
        Ok(company)
    }

    pub fn list(&self, filter: &CompanyFilter) -> Result<Vec<Company>, ServiceError> {
        self.store
            .read(|tx| tx.companies(filter).map_err(ServiceError::from))
    }

    pub fn get(&self, id: CompanyId) -> Result<Company, ServiceError> {
        self.store.read(|tx| {
            tx.company(id)?
                .ok_or_else(|| ServiceError::not_found("company", id))
        })
    }

    pub fn usage(&self, id: CompanyId) -> Result<QuotaUsage, ServiceError> {
        self.store.read(|tx| quota::usage(tx, id))
    }

    /// Switching plans requires the target plan to be active. A downgrade below current
    /// usage is accepted; it only blocks further creates.
    pub fn update(&self, id: CompanyId, payload: CompanyUpdate) -> Result<Company, ServiceError> {
        payload.validate()?;

        let company = self.store.write(|tx| {
            let mut company = tx
                .company(id)?
                .ok_or_else(|| ServiceError::not_found("company", id))?;

            if let Some(plan_id) = payload.plan_id {
                if plan_id != company.plan_id {
                    ensure_subscribable(&*tx, plan_id)?;
                    company.plan_id = plan_id;
                }
            }
            if let Some(name) = &payload.name {
                company.name = name.trim().to_string();
            }
            if let Some(domain) = &payload.domain {
                company.domain = normalize_domain(domain);
            }
            if payload.sector.is_some() {
                company.sector = payload.sector.clone();
            }
            if let Some(status) = payload.status {
                company.status = status;
            }
            company.updated_at = Utc::now();

            Ok::<_, ServiceError>(tx.update_company(company)?)
        })?;

        info!(company = %company.id, plan = %company.plan_id, "company updated");
        Ok(company)
    }

    /// Tenants owning any users, candidates, or vacancies are deactivated; empty ones are
    /// deleted outright.
    pub fn remove(&self, id: CompanyId) -> Result<RemovalReport, ServiceError> {
        let report = self.store.write(|tx| {
            let mut company = tx
                .company(id)?
                .ok_or_else(|| ServiceError::not_found("company", id))?;

            let mut owned = 0;
            for kind in ResourceKind::ordered() {
                owned += tx.count_resources(kind, id)?;
            }

            if owned > 0 {
                company.status = CompanyStatus::Inactive;
                company.updated_at = Utc::now();
                tx.update_company(company)?;
                return Ok(RemovalReport::soft(
                    "company",
                    id,
                    CompanyStatus::Inactive.label(),
                    owned,
                    "owned records",
                ));
            }

            tx.delete_company(id)?;
            Ok::<_, ServiceError>(RemovalReport::hard("company", id))
        })?;

        info!(company = %id, soft = report.is_soft(), "company removed");
        Ok(report)
    }
}
