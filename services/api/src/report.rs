use crate::infra::{load_store, parse_date};
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use talent_desk::config::{AppConfig, ReportingConfig};
use talent_desk::error::AppError;
use talent_desk::reporting::{report_date, ExportFormat, ReportAggregator, ReportKind};
use talent_desk::tenancy::CompanyId;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Report kind: overview, companies, candidates, vacancies, or applications
    #[arg(long)]
    pub(crate) kind: String,
    /// Output format: csv, excel, or pdf
    #[arg(long, default_value = "csv")]
    pub(crate) format: String,
    /// JSON snapshot to report on (overrides STORE_FIXTURES)
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
    /// Restrict the report to one company
    #[arg(long)]
    pub(crate) company_id: Option<CompanyId>,
    /// Reporting date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Destination file (defaults to the report's own file name)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fixtures = args.fixtures.clone().or(config.store.fixtures);
    let written = write_report(args, fixtures, config.reporting)?;
    println!(
        "Wrote {} ({} bytes, {})",
        written.path.display(),
        written.bytes,
        written.content_type
    );
    Ok(())
}

struct WrittenReport {
    path: PathBuf,
    bytes: usize,
    content_type: String,
}

fn write_report(
    args: ReportArgs,
    fixtures: Option<PathBuf>,
    reporting: ReportingConfig,
) -> Result<WrittenReport, AppError> {
    let kind = ReportKind::parse(&args.kind)?;
    let format = ExportFormat::parse(&args.format)?;
    let store = Arc::new(load_store(fixtures.as_deref())?);
    let aggregator = ReportAggregator::new(store, reporting);
    let today = report_date(args.today);

    let report = aggregator.export_report(kind, format, today, args.company_id)?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&report.filename));
    std::fs::write(&path, &report.buffer)?;

    Ok(WrittenReport {
        path,
        bytes: report.buffer.len(),
        content_type: report.content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use talent_desk::reporting::ReportError;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../crates/talent-desk/fixtures/tenant_snapshot.json")
    }

    fn args(kind: &str, format: &str, output: Option<PathBuf>) -> ReportArgs {
        ReportArgs {
            kind: kind.to_string(),
            format: format.to_string(),
            fixtures: None,
            company_id: None,
            today: NaiveDate::from_ymd_opt(2026, 2, 28),
            output,
        }
    }

    #[test]
    fn writes_the_export_to_the_requested_path() {
        let output = std::env::temp_dir().join("talent-desk-cli-candidates.csv");
        let written = write_report(
            args("candidates", "csv", Some(output.clone())),
            Some(fixture_path()),
            ReportingConfig::default(),
        )
        .expect("report written");

        assert_eq!(written.path, output);
        let contents = std::fs::read_to_string(&output).expect("csv on disk");
        assert!(contents.starts_with("Name,Email,Company"));
        assert_eq!(contents.lines().count(), 5);
        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn unknown_kind_fails_before_touching_the_store() {
        let err = write_report(
            args("payroll", "csv", None),
            Some(PathBuf::from("does/not/exist.json")),
            ReportingConfig::default(),
        )
        .err()
        .expect("unknown kind");
        assert!(matches!(err, AppError::Report(ReportError::UnknownKind(_))));
    }
}
