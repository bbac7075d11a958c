use chrono::NaiveDate;
use serde::Serialize;

use crate::tenancy::domain::CompanyId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub companies: u64,
    pub active_companies: u64,
    pub users: u64,
    pub candidates: u64,
    pub active_candidates: u64,
    pub hired_candidates: u64,
    pub vacancies: u64,
    pub open_vacancies: u64,
    pub applications: u64,
}

/// Rows created in one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionSeries {
    pub candidates: Vec<MonthBucket>,
    pub vacancies: Vec<MonthBucket>,
    pub applications: Vec<MonthBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdowns {
    pub candidates_by_state: Vec<CategoryCount>,
    pub companies_by_sector: Vec<CategoryCount>,
    pub vacancies_by_status: Vec<CategoryCount>,
    pub applications_by_status: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub id: String,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub companies_by_vacancies: Vec<RankingEntry>,
    pub vacancies_by_applications: Vec<RankingEntry>,
}

/// Immutable dashboard view computed from one consistent store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    pub months: u32,
    pub totals: Totals,
    pub evolution: EvolutionSeries,
    pub breakdowns: Breakdowns,
    pub rankings: Rankings,
}
