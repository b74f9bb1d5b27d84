use crate::estimate::{run_baseline, run_estimate, BaselineArgs, EstimateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use home_value::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "home-value",
    about = "Estimate residential property values from the command line or over HTTP",
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
    /// Value a single property described by a JSON request file
    Estimate(EstimateArgs),
    /// Show the reference price-per-square-foot table
    Baseline(BaselineArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate(args) => run_estimate(args).await,
        Command::Baseline(args) => run_baseline(args),
    }
}
