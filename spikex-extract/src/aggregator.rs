use spikex_core::{CountMatrix, RelativeTimestamp, SpikeStream, Stimulus, Timestamp};
use tracing::{debug, warn};

use crate::config::{CaptureWindow, ExtractionConfig};
use crate::error::AlignmentError;
use crate::windower::Cursor;

/// Counts spikes per channel inside the in- and out-of-stimulus capture
/// windows of every stimulus in a trial.
///
/// The in-window is relative to stimulus onset, the out-window to onset plus
/// `stimulus_duration`. Both are swept with one forward-only spike cursor, so
/// windows must not go backwards across the stimulus sequence; spikes in an
/// overlap are counted once, in the earlier window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeAggregator {
    pub in_window: CaptureWindow,
    pub out_window: CaptureWindow,
    pub stimulus_duration: RelativeTimestamp,
    pub channel_count: usize,
}

impl SpikeAggregator {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            in_window: config.in_window,
            out_window: config.out_window,
            stimulus_duration: config.tone_duration(),
            channel_count: config.channel_count,
        }
    }

    /// Absolute `[start, end)` of the in- and out-windows of one stimulus
    pub fn windows(&self, onset: Timestamp) -> [(Timestamp, Timestamp); 2] {
        let anchor = onset + self.stimulus_duration;
        [
            (onset + self.in_window.start(), onset + self.in_window.end()),
            (anchor + self.out_window.start(), anchor + self.out_window.end()),
        ]
    }

    pub fn aggregate(
        &self,
        stimuli: &[Stimulus],
        spikes: &SpikeStream,
        cursor: &mut Cursor,
    ) -> Result<(CountMatrix, CountMatrix), AlignmentError> {
        let mut in_counts = CountMatrix::zeros(stimuli.len(), self.channel_count);
        let mut out_counts = CountMatrix::zeros(stimuli.len(), self.channel_count);
        let mut previous_end: Option<Timestamp> = None;

        for (row, stimulus) in stimuli.iter().enumerate() {
            let [in_span, out_span] = self.windows(stimulus.onset());
            for (counts, (start, end)) in [(&mut in_counts, in_span), (&mut out_counts, out_span)] {
                if let Some(previous) = previous_end.filter(|&p| start < p) {
                    warn!(
                        stimulus = row,
                        %start,
                        %previous,
                        "capture window starts before the previous one ends"
                    );
                }
                self.sweep(spikes, cursor, start, end, row, counts)?;
                previous_end = Some(end);
            }
        }

        debug!(
            stimuli = stimuli.len(),
            in_total = in_counts.total(),
            out_total = out_counts.total(),
            "aggregated spikes"
        );
        Ok((in_counts, out_counts))
    }

    fn sweep(
        &self,
        spikes: &SpikeStream,
        cursor: &mut Cursor,
        start: Timestamp,
        end: Timestamp,
        row: usize,
        counts: &mut CountMatrix,
    ) -> Result<(), AlignmentError> {
        let all = spikes.spikes();
        while cursor.0 < all.len() && all[cursor.0].timestamp < start {
            cursor.0 += 1;
        }
        while cursor.0 < all.len() && all[cursor.0].timestamp < end {
            let spike = all[cursor.0];
            let channel = usize::from(spike.channel);
            if channel == 0 || !counts.increment(row, channel - 1) {
                return Err(AlignmentError::ChannelOutOfRange {
                    timestamp: spike.timestamp,
                    channel: spike.channel,
                    channel_count: self.channel_count,
                });
            }
            cursor.0 += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikex_core::{StimulusParameters, StimulusTiming, ToneParameters};

    fn stimulus(onset: f64) -> Stimulus {
        Stimulus {
            timing: StimulusTiming::new(
                Timestamp(onset),
                Timestamp(onset + 0.25),
                RelativeTimestamp(0.25),
                Timestamp(0.0),
            ),
            parameters: StimulusParameters::Tone(ToneParameters::default()),
        }
    }

    fn aggregator(channels: usize) -> SpikeAggregator {
        SpikeAggregator::from_config(&ExtractionConfig {
            channel_count: channels,
            ..ExtractionConfig::default()
        })
    }

    #[test]
    fn counts_land_in_their_windows() {
        // in: [1.0, 1.2)  out: [1.35, 1.5)
        let spikes = SpikeStream::from_parts(
            "CSPK",
            &[0.5, 1.0, 1.1, 1.2, 1.36, 1.49, 1.5, 2.05],
            &[1, 2, 2, 3, 4, 4, 1, 3],
        )
        .unwrap();
        let mut cursor = Cursor::default();
        let (in_counts, out_counts) = aggregator(4)
            .aggregate(&[stimulus(1.0), stimulus(2.0)], &spikes, &mut cursor)
            .unwrap();
        assert_eq!(in_counts.to_rows(), vec![vec![0, 2, 0, 0], vec![0, 0, 1, 0]]);
        assert_eq!(out_counts.to_rows(), vec![vec![0, 0, 0, 2], vec![0, 0, 0, 0]]);
        assert_eq!(cursor, Cursor(8));
    }

    #[test]
    fn no_spikes_left_is_not_an_error() {
        let spikes = SpikeStream::from_parts("CSPK", &[0.1], &[1]).unwrap();
        let mut cursor = Cursor::default();
        let (in_counts, out_counts) = aggregator(2)
            .aggregate(&[stimulus(5.0)], &spikes, &mut cursor)
            .unwrap();
        assert_eq!(in_counts.total() + out_counts.total(), 0);
        assert_eq!(cursor, Cursor(1));
    }

    #[test]
    fn channel_outside_session_is_rejected() {
        let spikes = SpikeStream::from_parts("CSPK", &[1.05], &[5]).unwrap();
        let mut cursor = Cursor::default();
        assert_eq!(
            aggregator(4).aggregate(&[stimulus(1.0)], &spikes, &mut cursor),
            Err(AlignmentError::ChannelOutOfRange {
                timestamp: Timestamp(1.05),
                channel: 5,
                channel_count: 4,
            })
        );

        let spikes = SpikeStream::from_parts("CSPK", &[1.05], &[0]).unwrap();
        let mut cursor = Cursor::default();
        assert!(aggregator(4).aggregate(&[stimulus(1.0)], &spikes, &mut cursor).is_err());
    }

    #[test]
    fn empty_trial_gives_empty_matrices() {
        let spikes = SpikeStream::from_parts("CSPK", &[1.0], &[1]).unwrap();
        let mut cursor = Cursor::default();
        let (in_counts, _) = aggregator(32).aggregate(&[], &spikes, &mut cursor).unwrap();
        assert_eq!(in_counts.shape(), (0, 32));
        assert_eq!(cursor, Cursor(0));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let spikes = SpikeStream::from_parts("CSPK", &[1.01, 1.02, 1.4], &[1, 2, 3]).unwrap();
        let stimuli = [stimulus(1.0)];
        let a = aggregator(3).aggregate(&stimuli, &spikes, &mut Cursor::default()).unwrap();
        let b = aggregator(3).aggregate(&stimuli, &spikes, &mut Cursor::default()).unwrap();
        assert_eq!(a, b);
    }
}
