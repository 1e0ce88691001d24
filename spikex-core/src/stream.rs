//! Time-ordered event and spike streams as read from a recording block.
//!
//! Onsets are expected to be non-decreasing within a stream. The sweeps in
//! the extractor rely on it and do not re-check on every step;
//! [`EventStream::check_monotonic`] exists for callers that want to pay for
//! the validation once up front.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::timestamp::Timestamp;

/// A single scalar epoch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub onset: Timestamp,
    pub offset: Option<Timestamp>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventStream {
    pub name: String,
    events: Vec<Event>,
}

impl EventStream {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }

    /// Builds a stream from the aligned arrays a block store exposes.
    /// `offsets` and `data` may be empty when the store does not carry them.
    pub fn from_parts(
        name: impl Into<String>,
        onsets: &[f64],
        offsets: &[f64],
        data: &[f64],
    ) -> Result<Self, CoreError> {
        let name = name.into();
        for (field, len) in [("offset", offsets.len()), ("data", data.len())] {
            if len != 0 && len != onsets.len() {
                return Err(CoreError::StreamLengthMismatch {
                    stream: name,
                    field,
                    got: len,
                    expected: onsets.len(),
                });
            }
        }
        let events = onsets
            .iter()
            .enumerate()
            .map(|(i, &onset)| Event {
                onset: Timestamp(onset),
                offset: offsets.get(i).copied().map(Timestamp),
                value: data.get(i).copied(),
            })
            .collect();
        Ok(Self { name, events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn onset(&self, index: usize) -> Option<Timestamp> {
        self.events.get(index).map(|e| e.onset)
    }

    /// Index of the first event with `onset >= ts`
    pub fn seek(&self, ts: Timestamp) -> usize {
        self.events.partition_point(|e| e.onset < ts)
    }

    pub fn check_monotonic(&self) -> Result<(), CoreError> {
        match self
            .events
            .windows(2)
            .position(|w| w[1].onset < w[0].onset)
        {
            Some(i) => Err(CoreError::NonMonotonic {
                stream: self.name.clone(),
                index: i + 1,
            }),
            None => Ok(()),
        }
    }
}

/// A single detected spike. Channels are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub timestamp: Timestamp,
    pub channel: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpikeStream {
    pub name: String,
    spikes: Vec<Spike>,
}

impl SpikeStream {
    pub fn new(name: impl Into<String>, spikes: Vec<Spike>) -> Self {
        Self {
            name: name.into(),
            spikes,
        }
    }

    pub fn from_parts(
        name: impl Into<String>,
        timestamps: &[f64],
        channels: &[u16],
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if timestamps.len() != channels.len() {
            return Err(CoreError::StreamLengthMismatch {
                stream: name,
                field: "channel",
                got: channels.len(),
                expected: timestamps.len(),
            });
        }
        let spikes = timestamps
            .iter()
            .zip(channels)
            .map(|(&ts, &channel)| Spike {
                timestamp: Timestamp(ts),
                channel,
            })
            .collect();
        Ok(Self { name, spikes })
    }

    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Spike> {
        self.spikes.get(index)
    }

    pub fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    /// Index of the first spike with `timestamp >= ts`
    pub fn seek(&self, ts: Timestamp) -> usize {
        self.spikes.partition_point(|s| s.timestamp < ts)
    }

    pub fn check_monotonic(&self) -> Result<(), CoreError> {
        match self
            .spikes
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            Some(i) => Err(CoreError::NonMonotonic {
                stream: self.name.clone(),
                index: i + 1,
            }),
            None => Ok(()),
        }
    }
}
