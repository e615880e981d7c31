mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use optimus_core::QuoteService;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::Diagnostics;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays a clean JSON document.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optimus=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    let config = commands::service_config(&cli)?;
    let service = QuoteService::builder().config(config).build();

    let result = commands::run(&cli, &service).await?;

    let diagnostics = if cli.show_cache {
        Some(Diagnostics {
            cache: service.cache_status().await,
            status: service.status().await,
        })
    } else {
        None
    };
    output::render(&result.data, diagnostics.as_ref(), cli.pretty)?;

    if result.failures > 0 {
        return Ok(ExitCode::from(3));
    }

    Ok(ExitCode::SUCCESS)
}
