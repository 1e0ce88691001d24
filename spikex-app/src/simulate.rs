use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spikex_extract::ExtractionConfig;

use crate::block_file::{BlockExport, EpochColumns, SnipColumns};

/// Shape of a synthetic recording
#[derive(Debug, Clone, Copy)]
pub struct Simulation {
    pub trials: usize,
    pub tones_per_trial: usize,
    pub channels: u16,
    pub seed: u64,
    /// Background firing rate per channel, Hz
    pub baseline_rate: f64,
    /// Extra firing rate during a tone on responsive channels, Hz
    pub evoked_rate: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            trials: 10,
            tones_per_trial: 16,
            channels: 32,
            seed: 1,
            baseline_rate: 5.0,
            evoked_rate: 80.0,
        }
    }
}

const FREQUENCIES: [f64; 2] = [4000.0, 8000.0];
const ATTENUATIONS: [f64; 4] = [10.0, 20.0, 30.0, 40.0];
/// Marker to first tone
const LEAD_IN: f64 = 0.1;
/// Trial end to next marker
const TRIAL_GAP: f64 = 2.0;

impl Simulation {
    /// Builds a block export laid out like the acquisition rig writes it:
    /// trial markers, tone onsets with paired frequency and attenuation
    /// events a few microseconds apart, and spikes on every channel.
    pub fn generate(&self, config: &ExtractionConfig) -> BlockExport {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let period = config.tone_duration + config.inter_tone_interval;
        let trial_length = LEAD_IN + period * self.tones_per_trial as f64 + TRIAL_GAP;

        let mut markers = EpochColumns::default();
        let mut tones = EpochColumns::default();
        let mut frequency = EpochColumns::default();
        let mut attenuation = EpochColumns::default();
        let mut tone_spans = Vec::new();

        for trial in 0..self.trials {
            let marker = trial as f64 * trial_length;
            markers.onset.push(marker);
            markers.data.push((trial + 1) as f64);

            let base = FREQUENCIES[trial % FREQUENCIES.len()];
            let alternate = FREQUENCIES[(trial + 1) % FREQUENCIES.len()];
            for k in 0..self.tones_per_trial {
                let onset = marker + LEAD_IN + period * k as f64;
                let offset = onset + config.tone_duration;
                tones.onset.push(onset);
                tones.offset.push(offset);
                tone_spans.push((onset, offset));

                let jitter = |rng: &mut StdRng| rng.random_range(-0.2..0.2) * config.tolerance;
                frequency.onset.push(onset + jitter(&mut rng));
                frequency
                    .data
                    .push(if rng.random_bool(0.2) { alternate } else { base });
                attenuation.onset.push(onset + jitter(&mut rng));
                attenuation
                    .data
                    .push(ATTENUATIONS[rng.random_range(0..ATTENUATIONS.len())]);
            }
        }

        let total = self.trials as f64 * trial_length;
        let mut spikes: Vec<(f64, u16)> = Vec::new();
        for channel in 1..=self.channels {
            let responsive = rng.random_bool(0.5);
            poisson(&mut rng, 0.0, total, self.baseline_rate, |t| {
                spikes.push((t, channel))
            });
            if responsive {
                for &(onset, offset) in &tone_spans {
                    poisson(&mut rng, onset, offset, self.evoked_rate, |t| {
                        spikes.push((t, channel))
                    });
                }
            }
        }
        spikes.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut export = BlockExport::default();
        let epochs = &config.epochs;
        export.epochs.insert(epochs.trial.clone(), markers);
        export.epochs.insert(epochs.stimulus.clone(), tones);
        export.epochs.insert(epochs.acoustic_frequency.clone(), frequency);
        export.epochs.insert(epochs.attenuation.clone(), attenuation);
        export.snips.insert(
            epochs.spikes.clone(),
            SnipColumns {
                timestamps: spikes.iter().map(|s| s.0).collect(),
                channels: spikes.iter().map(|s| s.1).collect(),
            },
        );
        export
    }
}

/// Exponential inter-arrival times at `rate` Hz over `[from, to)`
fn poisson(rng: &mut StdRng, from: f64, to: f64, rate: f64, mut emit: impl FnMut(f64)) {
    if rate <= 0.0 {
        return;
    }
    let mut t = from;
    loop {
        t += -(1.0 - rng.random::<f64>()).ln() / rate;
        if t >= to {
            break;
        }
        emit(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_block() {
        let config = ExtractionConfig::default();
        let sim = Simulation {
            trials: 3,
            ..Simulation::default()
        };
        assert_eq!(sim.generate(&config), sim.generate(&config));
    }

    #[test]
    fn layout_matches_request() {
        let config = ExtractionConfig::default();
        let sim = Simulation {
            trials: 4,
            tones_per_trial: 5,
            channels: 8,
            ..Simulation::default()
        };
        let export = sim.generate(&config);
        assert_eq!(export.epochs["TriS"].onset.len(), 4);
        assert_eq!(export.epochs["TriS"].data, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(export.epochs["StiS"].onset.len(), 20);
        assert_eq!(export.epochs["AFrq"].data.len(), 20);

        let spikes = &export.snips["CSPK"];
        assert!(spikes.timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(spikes.channels.iter().all(|&c| (1..=8).contains(&c)));
    }
}
