pub mod error;
pub mod exclusion;
pub mod filename;

pub use error::ExclusionError;
pub use exclusion::{DEFAULT_EXCLUSION_FILE_PREFIX, TrialExclusion};
pub use filename::{ExclusionDataType, ExclusionTrialsType, FilenameClass, classify_filename};
