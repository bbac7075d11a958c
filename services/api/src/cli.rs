use crate::report::{run_report, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use talent_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "talent-desk",
    about = "Run the multi-tenant recruitment API or export reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Export a report to disk as CSV, Excel, or PDF
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON snapshot used to seed the in-memory store (overrides STORE_FIXTURES)
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["talent-desk"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::try_parse_from([
            "talent-desk",
            "report",
            "--kind",
            "vacancies",
            "--format",
            "pdf",
            "--today",
            "2026-02-28",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.kind, "vacancies");
                assert_eq!(args.format, "pdf");
                assert_eq!(
                    args.today,
                    chrono::NaiveDate::from_ymd_opt(2026, 2, 28)
                );
            }
            other => panic!("expected report command, got {other:?}"),
        }
    }

    #[test]
    fn report_rejects_malformed_dates() {
        let parsed = Cli::try_parse_from([
            "talent-desk",
            "report",
            "--kind",
            "overview",
            "--today",
            "28/02/2026",
        ]);
        assert!(parsed.is_err());
    }
}
