use serde::Serialize;

use crate::matrix::CountMatrix;
use crate::stimulus::Stimulus;
use crate::timestamp::Timestamp;

/// Frequencies and attenuation levels presented during an acoustic trial
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AcousticSummary {
    pub base_frequency: Option<f64>,
    pub alternate_frequency: Option<f64>,
    /// Distinct attenuations in the order they were first presented
    pub amplitudes: Vec<f64>,
}

impl AcousticSummary {
    /// Base is the first frequency seen, alternate the first later one that
    /// differs from it. Stimuli without a frequency are skipped.
    pub fn from_stimuli(stimuli: &[Stimulus]) -> Self {
        let mut base_frequency = None;
        let mut alternate_frequency = None;
        for frequency in stimuli.iter().filter_map(|s| s.tone()?.frequency) {
            match base_frequency {
                None => base_frequency = Some(frequency),
                Some(base) if frequency != base => {
                    alternate_frequency = Some(frequency);
                    break;
                }
                Some(_) => {}
            }
        }

        let mut amplitudes: Vec<f64> = Vec::new();
        for attenuation in stimuli.iter().filter_map(|s| s.tone()?.attenuation) {
            if !amplitudes.contains(&attenuation) {
                amplitudes.push(attenuation);
            }
        }

        Self {
            base_frequency,
            alternate_frequency,
            amplitudes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "modality", rename_all = "snake_case")]
pub enum TrialModality {
    Acoustic(AcousticSummary),
    Electrical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialOutcome {
    Included {
        in_counts: CountMatrix,
        out_counts: CountMatrix,
    },
    Excluded {
        reason: String,
    },
}

/// One presentation cycle bounded by a trial marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trial {
    pub trial_number: i64,
    pub start: Timestamp,
    pub end: Timestamp,
    pub stimuli: Vec<Stimulus>,
    pub modality: TrialModality,
    pub outcome: TrialOutcome,
}

impl Trial {
    pub fn excluded(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Excluded { .. })
    }

    /// In- and out-of-stimulus counts, if the trial was included
    pub fn counts(&self) -> Option<(&CountMatrix, &CountMatrix)> {
        match &self.outcome {
            TrialOutcome::Included {
                in_counts,
                out_counts,
            } => Some((in_counts, out_counts)),
            TrialOutcome::Excluded { .. } => None,
        }
    }

    pub fn exclusion_reason(&self) -> Option<&str> {
        match &self.outcome {
            TrialOutcome::Excluded { reason } => Some(reason),
            TrialOutcome::Included { .. } => None,
        }
    }

    pub fn acoustic(&self) -> Option<&AcousticSummary> {
        match &self.modality {
            TrialModality::Acoustic(summary) => Some(summary),
            TrialModality::Electrical => None,
        }
    }
}
