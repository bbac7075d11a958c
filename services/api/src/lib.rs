mod cli;
mod infra;
mod report;
mod routes;
mod server;

use talent_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
