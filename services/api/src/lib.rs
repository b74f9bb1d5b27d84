mod cli;
mod estimate;
mod infra;
mod routes;
mod server;

use home_value::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
