use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExclusionError {
    #[error("more than one `Exclude after:` line (second on line {line})")]
    MultipleExcludeAfter { line: usize },

    #[error("more than one `Exclude before:` line (second on line {line})")]
    MultipleExcludeBefore { line: usize },

    #[error("failed to read exclusion file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
