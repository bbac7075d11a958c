use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use tracing::debug;

use super::export::{render, Cell, ExportFormat, ExportedReport, ReportKind, ReportTable};
use super::views::{
    Breakdowns, CategoryCount, DashboardSnapshot, EvolutionSeries, MonthBucket, RankingEntry,
    Rankings, Totals,
};
use super::ReportError;
use crate::config::{ReportingConfig, MAX_LOOKBACK_MONTHS};
use crate::tenancy::domain::{
    Application, ApplicationStatus, Candidate, CandidateId, CandidateStatus, Company, CompanyId,
    CompanyStatus, Plan, PlanId, User, Vacancy, VacancyId, VacancyStatus,
};
use crate::tenancy::store::{
    ApplicationFilter, CandidateFilter, CompanyFilter, TenantReader, TenantStore, UserFilter,
    VacancyFilter,
};

const UNSPECIFIED: &str = "Unspecified";

/// Every row a report needs, read from one snapshot.
struct Dataset {
    plans: Vec<Plan>,
    companies: Vec<Company>,
    users: Vec<User>,
    candidates: Vec<Candidate>,
    vacancies: Vec<Vacancy>,
    applications: Vec<Application>,
    candidate_skills: HashMap<CandidateId, usize>,
    vacancy_skills: HashMap<VacancyId, usize>,
}

impl Dataset {
    fn load(reader: &dyn TenantReader, scope: Option<CompanyId>) -> Result<Self, ReportError> {
        let companies = match scope {
            Some(id) => vec![reader.company(id)?.ok_or(ReportError::UnknownCompany(id))?],
            None => reader.companies(&CompanyFilter::default())?,
        };
        let users = reader.users(&UserFilter {
            company_id: scope,
            ..UserFilter::default()
        })?;
        let candidates = reader.candidates(&CandidateFilter {
            company_id: scope,
            ..CandidateFilter::default()
        })?;
        let vacancies = reader.vacancies(&VacancyFilter {
            company_id: scope,
            ..VacancyFilter::default()
        })?;
        let applications = reader.applications(&ApplicationFilter {
            company_id: scope,
            ..ApplicationFilter::default()
        })?;

        let mut candidate_skills = HashMap::new();
        for candidate in &candidates {
            candidate_skills.insert(candidate.id, reader.candidate_skills(candidate.id)?.len());
        }
        let mut vacancy_skills = HashMap::new();
        for vacancy in &vacancies {
            vacancy_skills.insert(vacancy.id, reader.vacancy_skills(vacancy.id)?.len());
        }

        Ok(Self {
            plans: reader.plans()?,
            companies,
            users,
            candidates,
            vacancies,
            applications,
            candidate_skills,
            vacancy_skills,
        })
    }

    fn company_names(&self) -> HashMap<CompanyId, &str> {
        self.companies
            .iter()
            .map(|company| (company.id, company.name.as_str()))
            .collect()
    }

    fn applications_per_candidate(&self) -> HashMap<CandidateId, u64> {
        let mut counts = HashMap::new();
        for application in &self.applications {
            *counts.entry(application.candidate_id).or_insert(0) += 1;
        }
        counts
    }

    fn applications_per_vacancy(&self) -> HashMap<VacancyId, u64> {
        let mut counts = HashMap::new();
        for application in &self.applications {
            *counts.entry(application.vacancy_id).or_insert(0) += 1;
        }
        counts
    }

    fn totals(&self) -> Totals {
        Totals {
            companies: count(self.companies.iter()),
            active_companies: count(
                self.companies
                    .iter()
                    .filter(|company| company.status == CompanyStatus::Active),
            ),
            users: count(self.users.iter()),
            candidates: count(self.candidates.iter()),
            active_candidates: count(self.candidates.iter().filter(|candidate| {
                matches!(
                    candidate.status,
                    CandidateStatus::Active | CandidateStatus::InProcess
                )
            })),
            hired_candidates: count(
                self.candidates
                    .iter()
                    .filter(|candidate| candidate.status == CandidateStatus::Hired),
            ),
            vacancies: count(self.vacancies.iter()),
            open_vacancies: count(
                self.vacancies
                    .iter()
                    .filter(|vacancy| vacancy.status == VacancyStatus::Open),
            ),
            applications: count(self.applications.iter()),
        }
    }

    fn evolution(&self, window: &[String]) -> EvolutionSeries {
        EvolutionSeries {
            candidates: monthly(window, self.candidates.iter().map(|row| row.created_at)),
            vacancies: monthly(window, self.vacancies.iter().map(|row| row.created_at)),
            applications: monthly(window, self.applications.iter().map(|row| row.created_at)),
        }
    }

    fn breakdowns(&self) -> Breakdowns {
        Breakdowns {
            candidates_by_state: tally(
                self.candidates
                    .iter()
                    .map(|candidate| label_or_unspecified(candidate.state.as_deref())),
            ),
            companies_by_sector: tally(
                self.companies
                    .iter()
                    .map(|company| label_or_unspecified(company.sector.as_deref())),
            ),
            vacancies_by_status: VacancyStatus::ordered()
                .into_iter()
                .map(|status| CategoryCount {
                    label: status.label().to_string(),
                    count: count(self.vacancies.iter().filter(|row| row.status == status)),
                })
                .collect(),
            applications_by_status: ApplicationStatus::ordered()
                .into_iter()
                .map(|status| CategoryCount {
                    label: status.label().to_string(),
                    count: count(self.applications.iter().filter(|row| row.status == status)),
                })
                .collect(),
        }
    }

    fn rankings(&self, top_n: usize) -> Rankings {
        let mut vacancies_per_company: HashMap<CompanyId, u64> = HashMap::new();
        for vacancy in &self.vacancies {
            *vacancies_per_company.entry(vacancy.company_id).or_insert(0) += 1;
        }
        let companies = self
            .companies
            .iter()
            .map(|company| RankingEntry {
                id: company.id.to_string(),
                name: company.name.clone(),
                count: vacancies_per_company.get(&company.id).copied().unwrap_or(0),
            })
            .collect();

        let per_vacancy = self.applications_per_vacancy();
        let vacancies = self
            .vacancies
            .iter()
            .map(|vacancy| RankingEntry {
                id: vacancy.id.to_string(),
                name: vacancy.title.clone(),
                count: per_vacancy.get(&vacancy.id).copied().unwrap_or(0),
            })
            .collect();

        Rankings {
            companies_by_vacancies: top(companies, top_n),
            vacancies_by_applications: top(vacancies, top_n),
        }
    }
}

fn count<T>(rows: impl Iterator<Item = T>) -> u64 {
    rows.count() as u64
}

fn label_or_unspecified(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNSPECIFIED.to_string(),
    }
}

/// Counts per label, largest first; ties sort alphabetically.
fn tally(labels: impl Iterator<Item = String>) -> Vec<CategoryCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut entries: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount { label, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

fn top(mut entries: Vec<RankingEntry>, top_n: usize) -> Vec<RankingEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(top_n);
    entries
}

/// `months` consecutive `YYYY-MM` keys ending at `today`'s month, oldest first.
pub fn month_window(today: NaiveDate, months: u32) -> Vec<String> {
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    (0..months)
        .rev()
        .filter_map(|back| first.checked_sub_months(Months::new(back)))
        .map(|month| month.format("%Y-%m").to_string())
        .collect()
}

fn monthly(window: &[String], created: impl Iterator<Item = DateTime<Utc>>) -> Vec<MonthBucket> {
    let mut buckets: Vec<MonthBucket> = window
        .iter()
        .map(|month| MonthBucket {
            month: month.clone(),
            count: 0,
        })
        .collect();
    for at in created {
        let key = at.format("%Y-%m").to_string();
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.month == key) {
            bucket.count += 1;
        }
    }
    buckets
}

fn day(at: DateTime<Utc>) -> Cell {
    Cell::Text(at.date_naive().to_string())
}

fn optional(value: Option<&str>) -> Cell {
    Cell::Text(value.unwrap_or_default().to_string())
}

/// Read-only dashboard and export builder. Never writes to the store.
pub struct ReportAggregator<S> {
    store: Arc<S>,
    config: ReportingConfig,
}

impl<S> ReportAggregator<S>
where
    S: TenantStore + 'static,
{
    pub fn new(store: Arc<S>, config: ReportingConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> ReportingConfig {
        self.config
    }

    fn load(&self, scope: Option<CompanyId>) -> Result<Dataset, ReportError> {
        self.store.read(|tx| Dataset::load(tx, scope))
    }

    /// `months` defaults to the configured lookback and must stay within 1..=24.
    pub fn dashboard(
        &self,
        today: NaiveDate,
        scope: Option<CompanyId>,
        months: Option<u32>,
    ) -> Result<DashboardSnapshot, ReportError> {
        let months = months.unwrap_or(self.config.lookback_months);
        if !(1..=MAX_LOOKBACK_MONTHS).contains(&months) {
            return Err(ReportError::InvalidWindow(months));
        }
        let dataset = self.load(scope)?;
        Ok(self.summarize(&dataset, today, scope, months))
    }

    fn summarize(
        &self,
        dataset: &Dataset,
        today: NaiveDate,
        scope: Option<CompanyId>,
        months: u32,
    ) -> DashboardSnapshot {
        let window = month_window(today, months);
        DashboardSnapshot {
            generated_on: today,
            company_id: scope,
            months,
            totals: dataset.totals(),
            evolution: dataset.evolution(&window),
            breakdowns: dataset.breakdowns(),
            rankings: dataset.rankings(self.config.top_n),
        }
    }

    /// Format-independent rows for `kind`.
    pub fn table(
        &self,
        kind: ReportKind,
        today: NaiveDate,
        scope: Option<CompanyId>,
    ) -> Result<ReportTable, ReportError> {
        let dataset = self.load(scope)?;
        let table = match kind {
            ReportKind::Overview => {
                let snapshot =
                    self.summarize(&dataset, today, scope, self.config.lookback_months);
                overview_table(&snapshot)
            }
            ReportKind::Companies => companies_table(&dataset),
            ReportKind::Candidates => candidates_table(&dataset),
            ReportKind::Vacancies => vacancies_table(&dataset),
            ReportKind::Applications => applications_table(&dataset),
        };
        debug!(
            kind = kind.label(),
            rows = table.rows.len(),
            "report table built"
        );
        Ok(table)
    }

    pub fn export_report(
        &self,
        kind: ReportKind,
        format: ExportFormat,
        today: NaiveDate,
        scope: Option<CompanyId>,
    ) -> Result<ExportedReport, ReportError> {
        let table = self.table(kind, today, scope)?;
        render(&table, kind, format, today)
    }
}

fn overview_table(snapshot: &DashboardSnapshot) -> ReportTable {
    let mut table = ReportTable::new(
        format!("Overview as of {}", snapshot.generated_on),
        &["Section", "Label", "Value"],
    );
    let totals = &snapshot.totals;
    for (label, value) in [
        ("Companies", totals.companies),
        ("Active companies", totals.active_companies),
        ("Users", totals.users),
        ("Candidates", totals.candidates),
        ("Active candidates", totals.active_candidates),
        ("Hired candidates", totals.hired_candidates),
        ("Vacancies", totals.vacancies),
        ("Open vacancies", totals.open_vacancies),
        ("Applications", totals.applications),
    ] {
        table.push(vec!["Totals".into(), label.into(), value.into()]);
    }

    let evolution = &snapshot.evolution;
    for (section, series) in [
        ("Candidates per month", &evolution.candidates),
        ("Vacancies per month", &evolution.vacancies),
        ("Applications per month", &evolution.applications),
    ] {
        for bucket in series {
            table.push(vec![
                section.into(),
                bucket.month.as_str().into(),
                bucket.count.into(),
            ]);
        }
    }

    let breakdowns = &snapshot.breakdowns;
    for (section, entries) in [
        ("Candidates by state", &breakdowns.candidates_by_state),
        ("Companies by sector", &breakdowns.companies_by_sector),
        ("Vacancies by status", &breakdowns.vacancies_by_status),
        ("Applications by status", &breakdowns.applications_by_status),
    ] {
        for entry in entries {
            table.push(vec![
                section.into(),
                entry.label.as_str().into(),
                entry.count.into(),
            ]);
        }
    }

    let rankings = &snapshot.rankings;
    for (section, entries) in [
        ("Top companies by vacancies", &rankings.companies_by_vacancies),
        ("Top vacancies by applications", &rankings.vacancies_by_applications),
    ] {
        for entry in entries {
            table.push(vec![
                section.into(),
                entry.name.as_str().into(),
                entry.count.into(),
            ]);
        }
    }
    table
}

fn companies_table(dataset: &Dataset) -> ReportTable {
    let plans: HashMap<PlanId, &str> = dataset
        .plans
        .iter()
        .map(|plan| (plan.id, plan.name.as_str()))
        .collect();
    let mut owned: HashMap<(CompanyId, u8), u64> = HashMap::new();
    for user in &dataset.users {
        if let Some(company_id) = user.company_id {
            *owned.entry((company_id, 0)).or_insert(0) += 1;
        }
    }
    for candidate in &dataset.candidates {
        *owned.entry((candidate.company_id, 1)).or_insert(0) += 1;
    }
    for vacancy in &dataset.vacancies {
        *owned.entry((vacancy.company_id, 2)).or_insert(0) += 1;
    }
    let owned_by = |id: CompanyId, slot: u8| owned.get(&(id, slot)).copied().unwrap_or(0);

    let mut table = ReportTable::new(
        "Companies",
        &[
            "Name",
            "Domain",
            "Sector",
            "Status",
            "Plan",
            "Users",
            "Candidates",
            "Vacancies",
            "Created",
        ],
    );
    for company in &dataset.companies {
        table.push(vec![
            company.name.as_str().into(),
            company.domain.as_str().into(),
            optional(company.sector.as_deref()),
            company.status.label().into(),
            plans.get(&company.plan_id).copied().unwrap_or_default().into(),
            owned_by(company.id, 0).into(),
            owned_by(company.id, 1).into(),
            owned_by(company.id, 2).into(),
            day(company.created_at),
        ]);
    }
    table
}

fn candidates_table(dataset: &Dataset) -> ReportTable {
    let companies = dataset.company_names();
    let applications = dataset.applications_per_candidate();
    let mut table = ReportTable::new(
        "Candidates",
        &[
            "Name",
            "Email",
            "Company",
            "State",
            "Status",
            "Skills",
            "Applications",
            "Created",
        ],
    );
    for candidate in &dataset.candidates {
        let skills = dataset
            .candidate_skills
            .get(&candidate.id)
            .copied()
            .unwrap_or(0);
        table.push(vec![
            candidate.name.as_str().into(),
            candidate.email.as_str().into(),
            companies
                .get(&candidate.company_id)
                .copied()
                .unwrap_or_default()
                .into(),
            optional(candidate.state.as_deref()),
            candidate.status.label().into(),
            (skills as u64).into(),
            applications
                .get(&candidate.id)
                .copied()
                .unwrap_or(0)
                .into(),
            day(candidate.created_at),
        ]);
    }
    table
}

fn vacancies_table(dataset: &Dataset) -> ReportTable {
    let companies = dataset.company_names();
    let applications = dataset.applications_per_vacancy();
    let mut table = ReportTable::new(
        "Vacancies",
        &[
            "Title",
            "Company",
            "Location",
            "Status",
            "Skills",
            "Applications",
            "Created",
        ],
    );
    for vacancy in &dataset.vacancies {
        let skills = dataset.vacancy_skills.get(&vacancy.id).copied().unwrap_or(0);
        table.push(vec![
            vacancy.title.as_str().into(),
            companies
                .get(&vacancy.company_id)
                .copied()
                .unwrap_or_default()
                .into(),
            optional(vacancy.location.as_deref()),
            vacancy.status.label().into(),
            (skills as u64).into(),
            applications.get(&vacancy.id).copied().unwrap_or(0).into(),
            day(vacancy.created_at),
        ]);
    }
    table
}

fn applications_table(dataset: &Dataset) -> ReportTable {
    let companies = dataset.company_names();
    let candidates: HashMap<CandidateId, &Candidate> = dataset
        .candidates
        .iter()
        .map(|candidate| (candidate.id, candidate))
        .collect();
    let vacancies: HashMap<VacancyId, &Vacancy> = dataset
        .vacancies
        .iter()
        .map(|vacancy| (vacancy.id, vacancy))
        .collect();

    let mut table = ReportTable::new(
        "Applications",
        &["Candidate", "Vacancy", "Company", "Status", "Applied", "Updated"],
    );
    for application in &dataset.applications {
        let vacancy = vacancies.get(&application.vacancy_id);
        let company = vacancy
            .and_then(|vacancy| companies.get(&vacancy.company_id))
            .copied()
            .unwrap_or_default();
        table.push(vec![
            candidates
                .get(&application.candidate_id)
                .map(|candidate| candidate.name.as_str())
                .unwrap_or_default()
                .into(),
            vacancy
                .map(|vacancy| vacancy.title.as_str())
                .unwrap_or_default()
                .into(),
            company.into(),
            application.status.label().into(),
            day(application.created_at),
            day(application.updated_at),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_ends_at_current_month_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 17).expect("valid");
        assert_eq!(
            month_window(today, 5),
            vec!["2025-10", "2025-11", "2025-12", "2026-01", "2026-02"]
        );
        assert_eq!(month_window(today, 1), vec!["2026-02"]);
    }

    #[test]
    fn monthly_counts_are_zero_filled() {
        let window = month_window(NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid"), 3);
        let created = [
            "2026-01-05T10:00:00Z",
            "2026-03-01T00:00:00Z",
            "2026-03-30T23:59:59Z",
            "2025-06-01T00:00:00Z",
        ]
        .into_iter()
        .map(|raw| raw.parse::<DateTime<Utc>>().expect("timestamp"));

        let buckets = monthly(&window, created);
        let counts: Vec<_> = buckets.iter().map(|bucket| bucket.count).collect();
        assert_eq!(counts, vec![1, 0, 2]);
        assert_eq!(buckets[1].month, "2026-02");
    }

    #[test]
    fn tally_orders_by_count_then_label() {
        let labels = ["SP", "RJ", "SP", "MG", "RJ", "SP"]
            .into_iter()
            .map(str::to_string);
        let entries = tally(labels);
        let flat: Vec<_> = entries
            .iter()
            .map(|entry| (entry.label.as_str(), entry.count))
            .collect();
        assert_eq!(flat, vec![("SP", 3), ("RJ", 2), ("MG", 1)]);
    }

    #[test]
    fn blank_labels_are_unspecified() {
        assert_eq!(label_or_unspecified(Some("  ")), UNSPECIFIED);
        assert_eq!(label_or_unspecified(None), UNSPECIFIED);
        assert_eq!(label_or_unspecified(Some(" Fintech ")), "Fintech");
    }
}
