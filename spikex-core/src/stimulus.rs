use serde::Serialize;

use crate::timestamp::{RelativeTimestamp, Timestamp};

/// Where a stimulus sits in the block and inside its trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StimulusTiming {
    pub onset: Timestamp,
    pub offset: Timestamp,
    /// End of the inter-stimulus interval following the stimulus
    pub interval_end: Timestamp,

    pub onset_in_trial: RelativeTimestamp,
    pub offset_in_trial: RelativeTimestamp,
    pub interval_end_in_trial: RelativeTimestamp,
}

impl StimulusTiming {
    pub fn new(
        onset: Timestamp,
        offset: Timestamp,
        interval: RelativeTimestamp,
        trial_start: Timestamp,
    ) -> Self {
        let interval_end = offset + interval;
        Self {
            onset,
            offset,
            interval_end,
            onset_in_trial: onset - trial_start,
            offset_in_trial: offset - trial_start,
            interval_end_in_trial: interval_end - trial_start,
        }
    }

    pub fn duration(&self) -> RelativeTimestamp {
        self.offset - self.onset
    }
}

/// Acoustic tone parameters; `None` when no parameter event was found within
/// tolerance of the stimulus onset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ToneParameters {
    /// Hz
    pub frequency: Option<f64>,
    /// dB
    pub attenuation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ElectricalParameters {
    pub current: Option<f64>,
    pub frequency: Option<f64>,
    /// Bitmask of stimulating electrodes
    pub stimulation_channels: Option<u32>,
    /// Bitmask of reference electrodes
    pub reference_channels: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StimulusParameters {
    Tone(ToneParameters),
    Electrical(ElectricalParameters),
}

/// One presentation inside a trial, followed by its inter-stimulus interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stimulus {
    #[serde(flatten)]
    pub timing: StimulusTiming,
    pub parameters: StimulusParameters,
}

impl Stimulus {
    pub fn onset(&self) -> Timestamp {
        self.timing.onset
    }

    pub fn tone(&self) -> Option<&ToneParameters> {
        match &self.parameters {
            StimulusParameters::Tone(t) => Some(t),
            StimulusParameters::Electrical(_) => None,
        }
    }

    pub fn electrical(&self) -> Option<&ElectricalParameters> {
        match &self.parameters {
            StimulusParameters::Electrical(e) => Some(e),
            StimulusParameters::Tone(_) => None,
        }
    }
}
