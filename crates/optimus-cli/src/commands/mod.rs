mod quote;
mod quotes;
mod watch;

use optimus_core::{QuoteService, ServiceConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// What a command hands back for rendering.
pub struct CommandResult {
    pub data: Value,
    /// Per-symbol failures that did not abort the command.
    pub failures: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self { data, failures: 0 }
    }

    pub fn with_failures(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }
}

/// Environment first, then any flags the caller passed.
pub fn service_config(cli: &Cli) -> Result<ServiceConfig, CliError> {
    let mut config = ServiceConfig::from_env()?;

    if let Some(mode) = cli.mode {
        config.fetch_mode = mode.into();
    }
    if let Some(market) = cli.market {
        config.market = market.into();
    }
    if let Some(ttl_secs) = cli.ttl_secs {
        config.cache_ttl = std::time::Duration::from_secs(ttl_secs);
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(concurrency) = cli.concurrency {
        config.batch_concurrency = usize::from(concurrency);
    }

    Ok(config)
}

pub async fn run(cli: &Cli, service: &QuoteService) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Quote(args) => quote::run(args, service).await,
        Command::Quotes(args) => quotes::run(args, service).await,
        Command::Watch(args) => watch::run(args, service).await,
    }
}
