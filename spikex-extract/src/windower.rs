use std::ops::Range;

use spikex_core::{EventStream, RelativeTimestamp, Timestamp};
use tracing::debug;

use crate::config::TrialWindow;
use crate::error::AlignmentError;

/// Forward-only read position into one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor(pub usize);

impl Cursor {
    pub fn position(self) -> usize {
        self.0
    }
}

/// Absolute time span of one trial, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRange {
    /// Position of the marker in the trial stream
    pub index: usize,
    pub trial_number: i64,
    /// Onset of the trial marker itself
    pub onset: Timestamp,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Applies the trial window to the marker at `index` of the trial stream
pub fn trial_range(
    trials: &EventStream,
    index: usize,
    window: TrialWindow,
) -> Result<TrialRange, AlignmentError> {
    let event = trials.get(index).ok_or(AlignmentError::NoSuchTrial {
        index,
        count: trials.len(),
    })?;
    let value = event
        .value
        .ok_or(AlignmentError::MissingTrialNumber { index })?;
    Ok(TrialRange {
        index,
        trial_number: value as i64,
        onset: event.onset,
        start: event.onset + RelativeTimestamp(window.from),
        end: event.onset + RelativeTimestamp(window.to),
    })
}

pub fn trial_ranges(
    trials: &EventStream,
    window: TrialWindow,
) -> Result<Vec<TrialRange>, AlignmentError> {
    (0..trials.len())
        .map(|index| trial_range(trials, index, window))
        .collect()
}

/// Picks out the stimuli that fall inside each trial range
#[derive(Debug, Clone, Copy)]
pub struct StimulusWindower<'a> {
    stimuli: &'a EventStream,
}

impl<'a> StimulusWindower<'a> {
    pub fn new(stimuli: &'a EventStream) -> Self {
        Self { stimuli }
    }

    pub fn stream(&self) -> &'a EventStream {
        self.stimuli
    }

    /// Index range of stimuli with `start <= onset < end`.
    ///
    /// Skips stimuli before `range.start` and leaves the cursor on the first
    /// stimulus at or after `range.end`, so consecutive trials can share it.
    pub fn window(&self, range: &TrialRange, cursor: &mut Cursor) -> Range<usize> {
        let events = self.stimuli.events();
        while cursor.0 < events.len() && events[cursor.0].onset < range.start {
            cursor.0 += 1;
        }
        let first = cursor.0;
        while cursor.0 < events.len() && events[cursor.0].onset < range.end {
            cursor.0 += 1;
        }
        debug!(
            trial = range.trial_number,
            stimuli = cursor.0 - first,
            "windowed stimuli"
        );
        first..cursor.0
    }
}
