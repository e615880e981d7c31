//! CLI argument definitions for Optimus.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch one quote |
//! | `quotes` | Fetch a batch of quotes |
//! | `watch` | Repeat a batch on an interval, reusing the cache |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--mode` | `strict` | Surface upstream errors or fall back to synthetic quotes |
//! | `--market` | `b3` | Symbol suffix and default currency |
//! | `--ttl-secs` | `600` | Cache freshness window |
//! | `--max-attempts` | `3` | Upstream attempts per symbol |
//! | `--concurrency` | `1` | Symbols fetched at once in a batch |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--show-cache` | `false` | Append cache and service status to the output |
//!
//! Unset options fall back to the `OPTIMUS_*` environment variables.
//!
//! # Examples
//!
//! ```bash
//! optimus quote PETR4
//! optimus quotes PETR4 VALE3 ITUB4 --pretty
//! optimus --mode fallback watch PETR4 VALE3 --rounds 3 --every-secs 10 --show-cache
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

use optimus_core::{FetchMode, Market};

/// Optimus - stock quotes with caching, retry and degraded-mode fallback
#[derive(Debug, Parser)]
#[command(
    name = "optimus",
    author,
    version,
    about = "Stock quotes with caching, retry and degraded-mode fallback"
)]
pub struct Cli {
    /// What to do when the upstream cannot produce a quote.
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ModeArg>,

    /// Market conventions for symbol suffix and currency.
    #[arg(long, global = true, value_enum)]
    pub market: Option<MarketArg>,

    /// Cache freshness window in seconds. 0 disables the cache.
    #[arg(long, global = true)]
    pub ttl_secs: Option<u64>,

    /// Upstream attempts per symbol.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Symbols fetched concurrently within a batch.
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Include the cache snapshot and service status in the output.
    #[arg(long, global = true, default_value_t = false)]
    pub show_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Surface upstream errors.
    Strict,
    /// Substitute synthetic quotes on upstream failure.
    Fallback,
}

impl From<ModeArg> for FetchMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Strict => Self::Strict,
            ModeArg::Fallback => Self::Fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketArg {
    /// Brazilian B3: `.SA` suffix, BRL.
    B3,
    /// US listings: no suffix, USD.
    Us,
}

impl From<MarketArg> for Market {
    fn from(value: MarketArg) -> Self {
        match value {
            MarketArg::B3 => Self::b3(),
            MarketArg::Us => Self::us(),
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for one symbol.
    ///
    ///   optimus quote PETR4
    ///   optimus quote vale3 --refresh
    Quote(QuoteArgs),

    /// Fetch quotes for several symbols; failures are reported per symbol.
    ///
    ///   optimus quotes PETR4 VALE3 ITUB4
    Quotes(QuotesArgs),

    /// Repeat a batch several times in one process.
    ///
    ///   optimus watch PETR4 VALE3 --rounds 5 --every-secs 30
    Watch(WatchArgs),
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Market symbol (e.g. PETR4 or PETR4.SA).
    pub symbol: String,

    /// Skip the cache read and fetch from upstream.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

/// Arguments for the `quotes` command.
#[derive(Debug, Args)]
pub struct QuotesArgs {
    /// One or more market symbols.
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

/// Arguments for the `watch` command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// One or more market symbols.
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,

    /// Number of batch rounds.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub rounds: u32,

    /// Seconds to wait between rounds.
    #[arg(long, default_value_t = 5)]
    pub every_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "optimus",
            "quotes",
            "PETR4",
            "VALE3",
            "--mode",
            "fallback",
            "--ttl-secs",
            "0",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.mode, Some(ModeArg::Fallback));
        assert_eq!(cli.ttl_secs, Some(0));
        match cli.command {
            Command::Quotes(args) => assert_eq!(args.symbols, vec!["PETR4", "VALE3"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn watch_requires_at_least_one_round() {
        let result = Cli::try_parse_from(["optimus", "watch", "PETR4", "--rounds", "0"]);
        assert!(result.is_err());
    }
}
