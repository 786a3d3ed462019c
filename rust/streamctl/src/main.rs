//! Stream record reader command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Print the records of a file, one per line
//! streamctl records events.jsonl
//!
//! # Print 100 records and save the position under the name "events"
//! streamctl records events.jsonl --limit 100 --save events
//!
//! # Continue from the saved position
//! streamctl records events.jsonl --resume checkpoints/events_00000001700000000000.ckpt
//!
//! # Count records, or look inside a checkpoint
//! streamctl count events.jsonl
//! streamctl inspect checkpoints/events_00000001700000000000.ckpt
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stream_core::{Runtime, RuntimeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stream record reader
#[derive(Parser, Debug)]
#[command(name = "streamctl")]
#[command(about = "Read delimited records with resumable positions")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print records, one per line
    Records {
        path: PathBuf,

        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,

        /// Checkpoint to resume from
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Save the final position as a checkpoint with this name
        #[arg(long)]
        save: Option<String>,

        /// Record format: "line" or "fixed:N"
        #[arg(long, default_value = "line")]
        format: String,
    },

    /// Count the records in a file
    Count {
        path: PathBuf,

        /// Record format: "line" or "fixed:N"
        #[arg(long, default_value = "line")]
        format: String,
    },

    /// Show the header and tape of a checkpoint
    Inspect { checkpoint: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only records.
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let runtime = create_runtime(args.config.as_ref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Records {
            path,
            limit,
            resume,
            save,
            format,
        } => {
            let options = commands::RecordsOptions {
                limit,
                resume,
                save,
                format,
            };
            let (_, saved) = commands::records(&runtime, &path, &options, &mut out)?;
            if let Some(checkpoint) = saved {
                eprintln!("saved position to {}", checkpoint.display());
            }
        }
        Command::Count { path, format } => {
            let count = commands::count(&runtime, &path, &format)?;
            commands::write_line(&mut out, &count.to_string())?;
        }
        Command::Inspect { checkpoint } => {
            commands::inspect(&runtime, &checkpoint, &mut out)?;
        }
    }

    Ok(())
}

/// Builds the runtime from `--config`, or from defaults rooted at the current
/// directory.
fn create_runtime(config_path: Option<&PathBuf>) -> stream_core::Result<Runtime> {
    match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Runtime::from_config_file(path)
        }
        None => {
            let mut config = RuntimeConfig::default();
            config.storage.base_path = PathBuf::from(".");
            Runtime::from_config(config.with_env_overrides())
        }
    }
}
