pub mod block;
pub mod error;
pub mod matrix;
pub mod session;
pub mod stimulus;
pub mod stream;
pub mod timestamp;
pub mod trial;

pub use block::{Block, BlockReader};
pub use error::CoreError;
pub use matrix::CountMatrix;
pub use session::Session;
pub use stimulus::{
    ElectricalParameters, Stimulus, StimulusParameters, StimulusTiming, ToneParameters,
};
pub use stream::{Event, EventStream, Spike, SpikeStream};
pub use timestamp::{RelativeTimestamp, Timestamp};
pub use trial::{AcousticSummary, Trial, TrialModality, TrialOutcome};
