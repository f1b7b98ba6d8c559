mod commands;
mod logging;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use output::{Output, OutputFormat};
use watch_sync_core::DedupPolicy;
use watch_sync_models::WatchKind;

#[derive(Parser)]
#[command(name = "rewind")]
#[command(about = "Sync your Trakt watch history and clean up duplicate plays")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize with Trakt using the PIN flow
    Auth,
    /// Fetch watch history from Trakt into the local cache
    Sync {
        /// Which history to sync
        #[arg(value_enum, default_value = "all")]
        kind: KindArg,
    },
    /// Find duplicate plays, optionally removing them
    Duplicates {
        /// Which history to scan
        #[arg(value_enum, default_value = "movies")]
        kind: SingleKindArg,

        /// Remove the flagged plays after confirmation
        #[arg(long)]
        fix: bool,

        /// Flag repeats within the same calendar day only
        #[arg(long)]
        daily: bool,
    },
    /// Remove every play on a given date
    RemoveDate {
        /// Date to clear, as YYYY-MM-DD
        date: String,

        /// Which history to remove from
        #[arg(value_enum, default_value = "movies")]
        kind: SingleKindArg,
    },
    /// Delete local state (cache, credentials)
    Clear {
        /// Delete both the cache and the stored credentials
        #[arg(long, conflicts_with_all = ["cache", "credentials"])]
        all: bool,

        /// Delete the local history cache
        #[arg(long)]
        cache: bool,

        /// Delete the stored API credentials and tokens
        #[arg(long)]
        credentials: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Movies,
    Episodes,
    All,
}

impl KindArg {
    fn kinds(self) -> Vec<WatchKind> {
        match self {
            KindArg::Movies => vec![WatchKind::Movie],
            KindArg::Episodes => vec![WatchKind::Episode],
            KindArg::All => vec![WatchKind::Movie, WatchKind::Episode],
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SingleKindArg {
    Movies,
    Episodes,
}

impl From<SingleKindArg> for WatchKind {
    fn from(arg: SingleKindArg) -> Self {
        match arg {
            SingleKindArg::Movies => WatchKind::Movie,
            SingleKindArg::Episodes => WatchKind::Episode,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    let output = Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Auth => commands::auth::run(&output).await,
        Commands::Sync { kind } => commands::sync::run(&kind.kinds(), &output).await,
        Commands::Duplicates { kind, fix, daily } => {
            let policy = if daily {
                DedupPolicy::PerDay
            } else {
                DedupPolicy::Global
            };
            commands::duplicates::run(kind.into(), policy, fix, &output).await
        }
        Commands::RemoveDate { date, kind } => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| color_eyre::eyre::eyre!("Invalid date '{}', expected YYYY-MM-DD", date))?;
            commands::remove_date::run(kind.into(), date, &output).await
        }
        Commands::Clear {
            all,
            cache,
            credentials,
        } => {
            if !all && !cache && !credentials {
                return Err(color_eyre::eyre::eyre!(
                    "Nothing to clear, pass --cache, --credentials or --all"
                ));
            }
            commands::clear::run(all || cache, all || credentials, &output)
        }
    }
}
