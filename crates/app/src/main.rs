//! Storefront Application CLI

use std::process::ExitCode;

use clap::Parser;
use storefront_app::telemetry;

mod cli;

#[tokio::main]
pub async fn main() -> ExitCode {
    let _env = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = telemetry::init(&cli.config.logging) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
