use std::path::PathBuf;

use spikex_core::{CoreError, Timestamp};
use spikex_transform::TransformError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("trial window end ({to}s) must be after its start ({from}s)")]
    TrialWindow { from: f64, to: f64 },

    #[error("{which} capture window end ({end}s) must be after its start ({start}s)")]
    CaptureWindow {
        which: &'static str,
        start: f64,
        end: f64,
    },

    #[error("timestamp tolerance must be positive, got {0}")]
    Tolerance(f64),

    #[error("{field} must not be negative, got {value}")]
    NegativeDuration { field: &'static str, value: f64 },

    #[error("channel count must be at least 1")]
    NoChannels,
}

/// Problems found while aligning one trial's streams
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("trial marker {index} carries no trial number")]
    MissingTrialNumber { index: usize },

    #[error("spike at {timestamp} is on channel {channel}, expected 1..={channel_count}")]
    ChannelOutOfRange {
        timestamp: Timestamp,
        channel: u16,
        channel_count: usize,
    },

    #[error("trial index {index} out of range, block has {count} trials")]
    NoSuchTrial { index: usize, count: usize },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid extraction config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load config {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to read block: {0}")]
    BlockRead(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Stream(#[from] CoreError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("trial {trial_number}: {source}")]
    Trial {
        trial_number: i64,
        #[source]
        source: AlignmentError,
    },

    #[error("trial {trial_number}: {source}")]
    Transform {
        trial_number: i64,
        #[source]
        source: TransformError,
    },
}
