//! barvault CLI - keeps a local OHLC archive in sync with a market-data provider.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod display;
mod logging;

use config::SyncOverrides;
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "barvault")]
#[command(about = "Incremental OHLC archive synchronizer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file. Defaults to ./barvault.toml when present.
    #[arg(short, long, global = true, env = "BARVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Archive root directory
    #[arg(short, long, global = true, env = "BARVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the provider bridge
    #[arg(long, global = true, env = "BARVAULT_PROVIDER_URL")]
    provider_url: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new bars for one or more symbols
    Sync {
        /// Symbols to sync. Defaults to the symbols listed in the config file.
        symbols: Vec<String>,

        /// Timeframes to sync, comma separated (e.g. M1,H1,D1). Defaults to all.
        #[arg(short, long, value_delimiter = ',')]
        timeframes: Vec<String>,

        /// Sync up to this time (YYYY-MM-DD or RFC 3339). Defaults to now.
        #[arg(short, long)]
        until: Option<String>,

        /// Start of history for series with no stored bars (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        epoch: Option<String>,

        /// Fixed fetch window in days (0 sizes windows by timeframe)
        #[arg(long)]
        chunk_days: Option<u32>,

        /// Skip series whose newest bar is this many days old or newer (0 disables)
        #[arg(long)]
        freshness_days: Option<u32>,

        /// Deadline for each provider call in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Maximum number of series synced concurrently
        #[arg(short, long)]
        parallel: Option<usize>,
    },

    /// List symbols known to the provider
    Symbols {
        /// Case-insensitive substring filter
        filter: Option<String>,

        /// Show only symbols selected for data delivery
        #[arg(long)]
        selected: bool,
    },

    /// Show stored series and mirror state
    Status {
        /// Restrict to these symbols
        symbols: Vec<String>,

        /// Restrict to these timeframes, comma separated
        #[arg(short, long, value_delimiter = ',')]
        timeframes: Vec<String>,
    },

    /// Regenerate Parquet mirrors from the canonical CSV files
    RebuildMirror {
        /// Restrict to these symbols
        symbols: Vec<String>,

        /// Restrict to these timeframes, comma separated
        #[arg(short, long, value_delimiter = ',')]
        timeframes: Vec<String>,
    },

    /// List supported timeframes
    Timeframes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_format)?;

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = config::load(cli.config.as_deref())?;

    match command {
        Commands::Sync {
            symbols,
            timeframes,
            until,
            epoch,
            chunk_days,
            freshness_days,
            deadline_secs,
            parallel,
        } => {
            let overrides = SyncOverrides {
                epoch,
                chunk_days,
                freshness_days,
                deadline_secs,
                parallel,
            };
            commands::sync::sync(
                &settings,
                cli.data_dir,
                cli.provider_url.as_deref(),
                symbols,
                timeframes,
                until.as_deref(),
                &overrides,
                cli.quiet,
            )
            .await
        }
        Commands::Symbols { filter, selected } => {
            commands::symbols::list_symbols(
                &settings,
                cli.provider_url.as_deref(),
                filter.as_deref(),
                selected,
            )
            .await
        }
        Commands::Status {
            symbols,
            timeframes,
        } => commands::status::status(&settings, cli.data_dir, &symbols, &timeframes),
        Commands::RebuildMirror {
            symbols,
            timeframes,
        } => commands::rebuild_mirror::rebuild_mirror(
            &settings,
            cli.data_dir,
            &symbols,
            &timeframes,
            cli.quiet,
        ),
        Commands::Timeframes => {
            commands::timeframes::list_timeframes();
            Ok(())
        }
    }
}
