//! Read-only dashboard aggregation and report export (CSV, Excel, PDF).

mod aggregator;
pub mod export;
pub mod router;
pub mod views;

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::error::error_response;
use crate::tenancy::access::AccessError;
use crate::tenancy::domain::CompanyId;
use crate::tenancy::store::StoreError;

pub use aggregator::{month_window, ReportAggregator};
pub use export::{Cell, ExportFormat, ExportedReport, ReportKind, ReportTable};
pub use router::reporting_router;
pub use views::DashboardSnapshot;

/// Day a report is computed for; every surface falls back to the current UTC date.
pub fn report_date(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| Utc::now().date_naive())
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unknown report kind '{0}'")]
    UnknownKind(String),
    #[error("unknown export format '{0}'; expected csv, excel, or pdf")]
    UnknownFormat(String),
    #[error("months must be between 1 and 24, got {0}")]
    InvalidWindow(u32),
    #[error("company {0} not found")]
    UnknownCompany(CompanyId),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("failed to render report: {0}")]
    Render(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ReportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownKind(_) | Self::UnknownFormat(_) | Self::InvalidWindow(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownCompany(_) => StatusCode::NOT_FOUND,
            Self::Access(AccessError::Denied { .. }) => StatusCode::FORBIDDEN,
            Self::Access(_) => StatusCode::UNAUTHORIZED,
            Self::Render(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "report generation failed");
        }
        error_response(status, self.to_string())
    }
}
