//! Plan quota policy.
//!
//! Pure reads over the store: the decision depends only on the company's plan and the number
//! of rows of the requested kind the company currently owns. Callers that create rows must
//! evaluate the check inside the same write transaction as the insert.

use serde::Serialize;
use tracing::warn;

use super::domain::{CompanyId, Plan, ResourceKind};
use super::error::ServiceError;
use super::store::TenantReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow { used: u64, limit: u32 },
    Deny { plan: String, limit: u32, reason: String },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Convert a denial into the error surfaced to callers.
    pub fn into_result(self, kind: ResourceKind) -> Result<(), ServiceError> {
        match self {
            Self::Allow { .. } => Ok(()),
            Self::Deny {
                plan,
                limit,
                reason,
            } => Err(ServiceError::QuotaExceeded {
                plan,
                resource: kind,
                limit,
                message: reason,
            }),
        }
    }
}

pub fn deny_reason(plan: &Plan, kind: ResourceKind, limit: u32) -> String {
    format!(
        "plan \"{}\" allows at most {} {}; upgrade the plan to add more",
        plan.name,
        limit,
        kind.label()
    )
}

fn company_plan<R>(reader: &R, company_id: CompanyId) -> Result<Plan, ServiceError>
where
    R: TenantReader + ?Sized,
{
    let company = reader
        .company(company_id)?
        .ok_or_else(|| ServiceError::not_found("company", company_id))?;
    reader
        .plan(company.plan_id)?
        .ok_or_else(|| ServiceError::not_found("plan", company.plan_id))
}

pub fn check_quota<R>(
    reader: &R,
    kind: ResourceKind,
    company_id: CompanyId,
) -> Result<QuotaDecision, ServiceError>
where
    R: TenantReader + ?Sized,
{
    let plan = company_plan(reader, company_id)?;
    let used = reader.count_resources(kind, company_id)?;
    let limit = plan.limit_for(kind);

    if used < u64::from(limit) {
        return Ok(QuotaDecision::Allow { used, limit });
    }

    warn!(
        company = %company_id,
        resource = kind.label(),
        used,
        limit,
        plan = %plan.name,
        "plan quota reached"
    );
    Ok(QuotaDecision::Deny {
        reason: deny_reason(&plan, kind, limit),
        plan: plan.name,
        limit,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsageEntry {
    pub resource: ResourceKind,
    pub used: u64,
    pub limit: u32,
    pub remaining: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub company_id: CompanyId,
    pub plan_name: String,
    pub entries: Vec<QuotaUsageEntry>,
}

/// Used/limit/remaining per resource kind so clients can render upgrade prompts.
pub fn usage<R>(reader: &R, company_id: CompanyId) -> Result<QuotaUsage, ServiceError>
where
    R: TenantReader + ?Sized,
{
    let plan = company_plan(reader, company_id)?;
    let entries = ResourceKind::ordered()
        .into_iter()
        .map(|kind| -> Result<QuotaUsageEntry, ServiceError> {
            let used = reader.count_resources(kind, company_id)?;
            let limit = plan.limit_for(kind);
            Ok(QuotaUsageEntry {
                resource: kind,
                used,
                limit,
                remaining: u64::from(limit).saturating_sub(used),
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    Ok(QuotaUsage {
        company_id,
        plan_name: plan.name,
        entries,
    })
}
