use spikex_core::{
    Block,
    CoreError,
    ElectricalParameters,
    EventStream,
    RelativeTimestamp,
    StimulusParameters,
    Timestamp,
    ToneParameters,
};
use tracing::warn;

use crate::config::{EpochNames, ExtractionConfig, Modality};
use crate::windower::Cursor;

/// Looks up the event that was emitted together with a stimulus on another
/// stream, allowing for a small timestamp jitter between the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TolerantMatcher {
    tolerance: RelativeTimestamp,
}

impl TolerantMatcher {
    pub fn new(tolerance: RelativeTimestamp) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> RelativeTimestamp {
        self.tolerance
    }

    /// Advances `cursor` past events more than the tolerance before `at`, then
    /// returns the value of the event under the cursor if it lies strictly
    /// within tolerance. The cursor is left on that event.
    pub fn match_at(
        &self,
        stream: &EventStream,
        cursor: &mut Cursor,
        at: Timestamp,
    ) -> Option<f64> {
        let events = stream.events();
        let earliest = at - self.tolerance;
        while cursor.0 < events.len() && events[cursor.0].onset < earliest {
            cursor.0 += 1;
        }
        let event = events.get(cursor.0)?;
        if (event.onset - at).abs() < self.tolerance {
            event.value
        } else {
            None
        }
    }
}

/// Auxiliary epochs carrying per-stimulus parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Attenuation,
    AcousticFrequency,
    StimulationCurrent,
    StimulationFrequency,
    StimulationChannels,
    ReferenceChannels,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::Attenuation,
        Parameter::AcousticFrequency,
        Parameter::StimulationCurrent,
        Parameter::StimulationFrequency,
        Parameter::StimulationChannels,
        Parameter::ReferenceChannels,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn epoch<'a>(self, names: &'a EpochNames) -> &'a str {
        match self {
            Parameter::Attenuation => &names.attenuation,
            Parameter::AcousticFrequency => &names.acoustic_frequency,
            Parameter::StimulationCurrent => &names.stimulation_current,
            Parameter::StimulationFrequency => &names.stimulation_frequency,
            Parameter::StimulationChannels => &names.stimulation_channels_bitmask,
            Parameter::ReferenceChannels => &names.reference_channels_bitmask,
        }
    }

    fn modality(self) -> Modality {
        match self {
            Parameter::Attenuation | Parameter::AcousticFrequency => Modality::Acoustic,
            _ => Modality::Electrical,
        }
    }
}

/// One cursor per auxiliary parameter stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterCursors {
    cursors: [Cursor; Parameter::ALL.len()],
}

impl ParameterCursors {
    pub fn get(&self, parameter: Parameter) -> Cursor {
        self.cursors[parameter.slot()]
    }

    pub fn get_mut(&mut self, parameter: Parameter) -> &mut Cursor {
        &mut self.cursors[parameter.slot()]
    }
}

/// Attaches parameter values to stimuli for one modality
#[derive(Debug, Clone)]
pub struct ParameterMatcher<'a> {
    matcher: TolerantMatcher,
    modality: Modality,
    streams: [Option<&'a EventStream>; Parameter::ALL.len()],
}

impl<'a> ParameterMatcher<'a> {
    /// Resolves the parameter epochs of `config.modality` in `block`. Missing
    /// epochs are logged and leave the matching parameter empty on every
    /// stimulus.
    pub fn new(block: &'a Block, config: &ExtractionConfig) -> Self {
        let mut streams = [None; Parameter::ALL.len()];
        for parameter in Parameter::ALL {
            if parameter.modality() != config.modality {
                continue;
            }
            let name = parameter.epoch(&config.epochs);
            streams[parameter.slot()] = block.optional_epoch(&EpochNames::atom(name));
            if streams[parameter.slot()].is_none() {
                warn!(
                    epoch = name,
                    ?parameter,
                    "parameter epoch not found in block, values will be empty"
                );
            }
        }
        Self {
            matcher: TolerantMatcher::new(config.tolerance()),
            modality: config.modality,
            streams,
        }
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn check_monotonic(&self) -> Result<(), CoreError> {
        for stream in self.streams.iter().flatten() {
            stream.check_monotonic()?;
        }
        Ok(())
    }

    /// Cursors positioned just before `at`, minus the tolerance, so a
    /// parameter event slightly ahead of the first stimulus is not skipped
    pub fn seek(&self, at: Timestamp) -> ParameterCursors {
        let earliest = at - self.matcher.tolerance();
        let mut cursors = ParameterCursors::default();
        for parameter in Parameter::ALL {
            if let Some(stream) = self.streams[parameter.slot()] {
                *cursors.get_mut(parameter) = Cursor(stream.seek(earliest));
            }
        }
        cursors
    }

    fn value(
        &self,
        parameter: Parameter,
        cursors: &mut ParameterCursors,
        at: Timestamp,
    ) -> Option<f64> {
        let stream = self.streams[parameter.slot()]?;
        self.matcher.match_at(stream, cursors.get_mut(parameter), at)
    }

    pub fn parameters(
        &self,
        onset: Timestamp,
        cursors: &mut ParameterCursors,
    ) -> StimulusParameters {
        match self.modality {
            Modality::Acoustic => StimulusParameters::Tone(ToneParameters {
                frequency: self.value(Parameter::AcousticFrequency, cursors, onset),
                attenuation: self.value(Parameter::Attenuation, cursors, onset),
            }),
            Modality::Electrical => StimulusParameters::Electrical(ElectricalParameters {
                current: self.value(Parameter::StimulationCurrent, cursors, onset),
                frequency: self.value(Parameter::StimulationFrequency, cursors, onset),
                stimulation_channels: self
                    .value(Parameter::StimulationChannels, cursors, onset)
                    .map(|v| v as u32),
                reference_channels: self
                    .value(Parameter::ReferenceChannels, cursors, onset)
                    .map(|v| v as u32),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(onsets: &[f64], values: &[f64]) -> EventStream {
        EventStream::from_parts("AFrq", onsets, &[], values).unwrap()
    }

    fn matcher() -> TolerantMatcher {
        TolerantMatcher::new(RelativeTimestamp(0.001))
    }

    #[test]
    fn matches_within_tolerance_on_either_side() {
        let s = stream(&[0.9995, 2.0004], &[1000.0, 2000.0]);
        let mut cursor = Cursor::default();
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(1.0)), Some(1000.0));
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(2.0)), Some(2000.0));
    }

    #[test]
    fn tolerance_bound_is_exclusive() {
        let s = stream(&[1.0], &[1000.0]);
        let mut cursor = Cursor::default();
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(1.25)), None);
        let mut cursor = Cursor::default();
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(0.5)), None);
        assert_eq!(cursor, Cursor(0));
    }

    #[test]
    fn exhausted_stream_yields_none() {
        let s = stream(&[0.1], &[1.0]);
        let mut cursor = Cursor::default();
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(5.0)), None);
        assert_eq!(cursor, Cursor(1));
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(6.0)), None);
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let s = stream(&[1.0, 2.0], &[1.0, 2.0]);
        let mut cursor = Cursor(1);
        assert_eq!(matcher().match_at(&s, &mut cursor, Timestamp(1.0)), None);
        assert_eq!(cursor, Cursor(1));
    }

    #[test]
    fn parameter_matcher_fills_tone_fields() {
        let block = Block::new()
            .with_epoch(EventStream::from_parts("AFrq", &[1.0], &[], &[4000.0]).unwrap())
            .with_epoch(EventStream::from_parts("Attn", &[1.0005], &[], &[30.0]).unwrap());
        let config = ExtractionConfig::default();
        let pm = ParameterMatcher::new(&block, &config);
        let mut cursors = pm.seek(Timestamp(0.0));
        let params = pm.parameters(Timestamp(1.0), &mut cursors);
        assert_eq!(
            params,
            StimulusParameters::Tone(ToneParameters {
                frequency: Some(4000.0),
                attenuation: Some(30.0),
            })
        );
    }

    #[test]
    fn missing_epochs_leave_parameters_empty() {
        let block = Block::new();
        let config = ExtractionConfig {
            modality: Modality::Electrical,
            ..ExtractionConfig::default()
        };
        let pm = ParameterMatcher::new(&block, &config);
        let mut cursors = ParameterCursors::default();
        assert_eq!(
            pm.parameters(Timestamp(1.0), &mut cursors),
            StimulusParameters::Electrical(ElectricalParameters::default())
        );
    }

    #[test]
    fn bitmasks_are_read_as_integers() {
        let block = Block::new()
            .with_epoch(EventStream::from_parts("StBM", &[1.0], &[], &[5.0]).unwrap())
            .with_epoch(EventStream::from_parts("Curr", &[1.0], &[], &[12.5]).unwrap());
        let config = ExtractionConfig {
            modality: Modality::Electrical,
            ..ExtractionConfig::default()
        };
        let pm = ParameterMatcher::new(&block, &config);
        let mut cursors = pm.seek(Timestamp(0.0));
        let params = pm.parameters(Timestamp(1.0), &mut cursors);
        let e = match params {
            StimulusParameters::Electrical(e) => e,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(e.stimulation_channels, Some(5));
        assert_eq!(e.current, Some(12.5));
        assert_eq!(e.reference_channels, None);
    }
}
