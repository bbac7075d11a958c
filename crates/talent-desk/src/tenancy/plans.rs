use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{Plan, PlanId, PlanType};
use super::error::ServiceError;
use super::lifecycle::RemovalReport;
use super::payloads::{NewPlan, PlanUpdate};
use super::store::{TenantReader, TenantStore};
use super::validation::{Validate, ValidationError};

fn ensure_single_active<R>(
    reader: &R,
    plan_type: PlanType,
    except: Option<PlanId>,
) -> Result<(), ServiceError>
where
    R: TenantReader + ?Sized,
{
    let clash = reader
        .plans()?
        .into_iter()
        .any(|plan| plan.is_active && plan.plan_type == plan_type && Some(plan.id) != except);
    if clash {
        return Err(ServiceError::Conflict(format!(
            "an active {} plan already exists",
            plan_type.label()
        )));
    }
    Ok(())
}

/// Subscription tier catalogue. At most one active plan exists per [`PlanType`].
pub struct PlanService<S> {
    store: Arc<S>,
}

impl<S> PlanService<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, payload: NewPlan) -> Result<Plan, ServiceError> {
        payload.validate()?;
        let now = Utc::now();

        let plan = self.store.write(|tx| {
            if payload.is_active {
                ensure_single_active(&*tx, payload.plan_type, None)?;
            }
            Ok::<_, ServiceError>(tx.insert_plan(Plan {
                id: PlanId::generate(),
                name: payload.name.trim().to_string(),
                plan_type: payload.plan_type,
                max_users: payload.max_users,
                max_candidates: payload.max_candidates,
                max_vacancies: payload.max_vacancies,
                price: payload.price,
                is_active: payload.is_active,
                created_at: now,
                updated_at: now,
            })?)
        })?;

        info!(plan = %plan.id, plan_type = plan.plan_type.label(), "plan created");
        Ok(plan)
    }

    pub fn list(&self) -> Result<Vec<Plan>, ServiceError> {
        self.store.read(|tx| tx.plans().map_err(ServiceError::from))
    }

    pub fn get(&self, id: PlanId) -> Result<Plan, ServiceError> {
        self.store.read(|tx| {
            tx.plan(id)?
                .ok_or_else(|| ServiceError::not_found("plan", id))
        })
    }

    /// Limits and price may change freely; lowering a limit below current usage only blocks
    /// further creates. The plan type is fixed once created.
    pub fn update(&self, id: PlanId, payload: PlanUpdate) -> Result<Plan, ServiceError> {
        payload.validate()?;

        self.store.write(|tx| {
            let mut plan = tx
                .plan(id)?
                .ok_or_else(|| ServiceError::not_found("plan", id))?;

            if let Some(plan_type) = payload.plan_type {
                if plan_type != plan.plan_type {
                    return Err(ValidationError::invalid(
                        "type",
                        "plan type cannot be changed after creation",
                    )
                    .into());
                }
            }
            if payload.is_active == Some(true) && !plan.is_active {
                ensure_single_active(&*tx, plan.plan_type, Some(id))?;
            }

            if let Some(name) = &payload.name {
                plan.name = name.trim().to_string();
            }
            if let Some(max_users) = payload.max_users {
                plan.max_users = max_users;
            }
            if let Some(max_candidates) = payload.max_candidates {
                plan.max_candidates = max_candidates;
            }
            if let Some(max_vacancies) = payload.max_vacancies {
                plan.max_vacancies = max_vacancies;
            }
            if let Some(price) = payload.price {
                plan.price = price;
            }
            if let Some(is_active) = payload.is_active {
                plan.is_active = is_active;
            }
            plan.updated_at = Utc::now();

            Ok(tx.update_plan(plan)?)
        })
    }

    /// Plans with subscribed companies cannot be removed; deactivate them instead.
    pub fn remove(&self, id: PlanId) -> Result<RemovalReport, ServiceError> {
        self.store.write(|tx| {
            if tx.plan(id)?.is_none() {
                return Err(ServiceError::not_found("plan", id));
            }
            let subscribed = tx.count_companies_on_plan(id)?;
            if subscribed > 0 {
                return Err(ServiceError::Conflict(format!(
                    "plan {id} is used by {subscribed} companies; deactivate it instead"
                )));
            }
            tx.delete_plan(id)?;
            info!(plan = %id, "plan deleted");
            Ok(RemovalReport::hard("plan", id))
        })
    }
}
