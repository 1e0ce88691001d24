use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// spikex command line
#[derive(Parser, Debug)]
#[command(name = "spikex")]
#[command(
    author,
    version,
    about = "Spike count extraction for stimulation sessions",
    long_about = None
)]
pub struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract per-trial spike counts from a block export
    Extract {
        /// JSON block export
        #[arg(short, long)]
        block: PathBuf,

        /// JSON extraction config; unset fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Channel map file; searched for next to the block when omitted
        #[arg(long)]
        channel_map: Option<PathBuf>,

        /// Directory to search for exclusion files, walking up to the root.
        /// Defaults to the block's directory.
        #[arg(long)]
        exclusions: Option<PathBuf>,

        /// Where to write the session JSON; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write in/out count heatmaps for every included trial here
        #[arg(long)]
        heatmaps: Option<PathBuf>,

        /// Trial window start relative to each trial marker, seconds
        #[arg(long, allow_hyphen_values = true)]
        from: Option<f64>,

        /// Trial window end relative to each trial marker, seconds
        #[arg(long, allow_hyphen_values = true)]
        to: Option<f64>,
    },

    /// Write a synthetic block export
    Simulate {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value = "10")]
        trials: usize,

        /// Tones per trial
        #[arg(long, default_value = "16")]
        tones: usize,

        #[arg(long, default_value = "32")]
        channels: u16,

        #[arg(long, default_value = "1")]
        seed: u64,
    },

    /// Print the extraction settings in effect
    Summary {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Block the summary refers to
        #[arg(short, long)]
        block: Option<PathBuf>,
    },
}

pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
