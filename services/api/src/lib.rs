mod cli;
mod infra;
mod routes;
mod server;

use barangay_portal::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
