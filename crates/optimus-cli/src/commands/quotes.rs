use optimus_core::QuoteService;

use crate::cli::QuotesArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &QuotesArgs, service: &QuoteService) -> Result<CommandResult, CliError> {
    let batch = service.get_quotes(&args.symbols).await?;
    let failures = batch.error_count();

    Ok(CommandResult::ok(serde_json::to_value(batch)?).with_failures(failures))
}
