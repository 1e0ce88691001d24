use spikex_cache::EpochName;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("stream {stream}: {field} has {got} entries, expected {expected}")]
    StreamLengthMismatch {
        stream: String,
        field: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("stream {stream} is not time-ordered at index {index}")]
    NonMonotonic { stream: String, index: usize },

    #[error("block has no {kind} store named {name}")]
    MissingStream { kind: &'static str, name: EpochName },

    #[error("count matrix rows have unequal widths: row {row} has {got}, expected {expected}")]
    RaggedRows {
        row: usize,
        got: usize,
        expected: usize,
    },
}
