use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::aggregator::ReportAggregator;
use super::export::{ExportFormat, ReportKind};
use super::{report_date, ReportError};
use crate::tenancy::access::{Actor, Permission};
use crate::tenancy::domain::CompanyId;
use crate::tenancy::extract::ApiQuery;
use crate::tenancy::store::TenantStore;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub company_id: Option<CompanyId>,
    pub months: Option<u32>,
    /// Reference day for the evolution window; defaults to the current UTC date.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub format: Option<String>,
    pub company_id: Option<CompanyId>,
    pub today: Option<NaiveDate>,
}

/// Router builder exposing the dashboard and export endpoints.
pub fn reporting_router<S>(aggregator: Arc<ReportAggregator<S>>) -> Router
where
    S: TenantStore + 'static,
{
    Router::new()
        .route("/api/v1/reports/dashboard", get(dashboard_handler::<S>))
        .route("/api/v1/reports/:kind/export", get(export_handler::<S>))
        .with_state(aggregator)
}

pub(crate) async fn dashboard_handler<S>(
    State(aggregator): State<Arc<ReportAggregator<S>>>,
    actor: Actor,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Response, ReportError>
where
    S: TenantStore + 'static,
{
    actor.require(Permission::ViewReports)?;
    let today = report_date(query.today);
    let snapshot = aggregator.dashboard(today, query.company_id, query.months)?;
    Ok(Json(snapshot).into_response())
}

pub(crate) async fn export_handler<S>(
    State(aggregator): State<Arc<ReportAggregator<S>>>,
    actor: Actor,
    Path(kind): Path<String>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ReportError>
where
    S: TenantStore + 'static,
{
    actor.require(Permission::ViewReports)?;
    let kind = ReportKind::parse(&kind)?;
    let format = ExportFormat::parse(query.format.as_deref().unwrap_or("csv"))?;
    let today = report_date(query.today);

    let report = aggregator.export_report(kind, format, today, query.company_id)?;
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    Ok((
        [
            (header::CONTENT_TYPE, report.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.buffer,
    )
        .into_response())
}
