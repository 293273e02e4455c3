mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use deal_or_disaster::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
