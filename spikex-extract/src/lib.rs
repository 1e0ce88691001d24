pub mod aggregator;
pub mod config;
pub mod error;
pub mod matcher;
pub mod processor;
pub mod windower;

pub use aggregator::SpikeAggregator;
pub use config::{CaptureWindow, EpochNames, ExtractionConfig, Modality, TrialWindow};
pub use error::{AlignmentError, ConfigError, ExtractError};
pub use matcher::{Parameter, ParameterCursors, ParameterMatcher, TolerantMatcher};
pub use processor::SessionProcessor;
pub use windower::{Cursor, StimulusWindower, TrialRange, trial_range, trial_ranges};
