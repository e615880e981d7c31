use optimus_core::{CacheMode, QuoteService};

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &QuoteArgs, service: &QuoteService) -> Result<CommandResult, CliError> {
    let mode = if args.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    };

    let quote = service.get_quote_with(&args.symbol, mode).await?;
    Ok(CommandResult::ok(serde_json::to_value(quote)?))
}
