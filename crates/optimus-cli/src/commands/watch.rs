use std::time::Duration;

use optimus_core::{BatchResult, QuoteService};
use serde::Serialize;
use tracing::info;

use crate::cli::WatchArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct WatchRound {
    round: u32,
    #[serde(flatten)]
    batch: BatchResult,
}

/// Runs the same batch `rounds` times. Rounds inside the cache TTL are served
/// from the cache, so only the first one normally reaches the upstream.
pub async fn run(args: &WatchArgs, service: &QuoteService) -> Result<CommandResult, CliError> {
    let mut rounds = Vec::with_capacity(args.rounds as usize);
    let mut failures = 0;

    for round in 1..=args.rounds {
        if round > 1 {
            tokio::time::sleep(Duration::from_secs(args.every_secs)).await;
        }

        let batch = service.get_quotes(&args.symbols).await?;
        info!(
            round,
            successful = batch.total_successful,
            failed = batch.error_count(),
            "watch round complete"
        );
        failures += batch.error_count();
        rounds.push(WatchRound { round, batch });
    }

    Ok(CommandResult::ok(serde_json::to_value(rounds)?).with_failures(failures))
}
