use std::path::PathBuf;

use thiserror::Error;

use crate::channel_map::MapViolation;

#[derive(Error, Debug)]
pub enum ChannelMapError {
    #[error("Channel map contains errors: {}", join_violations(.0))]
    Invalid(Vec<MapViolation>),

    #[error("Invalid header line: {0:?}")]
    InvalidHeader(String),

    #[error("line {line}: expected `source<TAB>destination`, got {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("line {line}: {field:?} is not a channel number")]
    NotAChannel { line: usize, field: String },

    #[error("failed to read channel map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_violations(violations: &[MapViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("{stage}: matrix has {got} channels but the stage expects {expected}")]
    ShapeMismatch {
        stage: &'static str,
        got: usize,
        expected: usize,
    },
}
