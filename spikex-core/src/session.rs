use serde::Serialize;

use crate::trial::Trial;

/// All trials extracted from one recording session, in trial order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Session {
    pub trials: Vec<Trial>,
}

impl Session {
    pub fn new(trials: Vec<Trial>) -> Self {
        Self { trials }
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }

    pub fn included(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(|t| !t.excluded())
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(|t| t.excluded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CountMatrix;
    use crate::timestamp::Timestamp;
    use crate::trial::{TrialModality, TrialOutcome};

    fn trial(n: i64, excluded: bool) -> Trial {
        Trial {
            trial_number: n,
            start: Timestamp(n as f64),
            end: Timestamp(n as f64 + 1.0),
            stimuli: vec![],
            modality: TrialModality::Electrical,
            outcome: if excluded {
                TrialOutcome::Excluded { reason: String::new() }
            } else {
                TrialOutcome::Included {
                    in_counts: CountMatrix::zeros(0, 2),
                    out_counts: CountMatrix::zeros(0, 2),
                }
            },
        }
    }

    #[test]
    fn trial_count_tracks_trials() {
        let mut s = Session::default();
        assert_eq!(s.trial_count(), 0);
        s.trials.extend([trial(1, false), trial(2, true), trial(3, false)]);
        assert_eq!(s.trial_count(), 3);
        assert_eq!(s.included().map(|t| t.trial_number).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(s.excluded().count(), 1);
    }
}
