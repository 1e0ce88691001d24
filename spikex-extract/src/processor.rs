use spikex_cache::ReadCache;
use spikex_core::{
    AcousticSummary, Block, BlockReader, CountMatrix, EventStream, Session, SpikeStream,
    Stimulus, StimulusTiming, Trial, TrialModality, TrialOutcome,
};
use spikex_exclusion::{ExclusionDataType, ExclusionTrialsType, TrialExclusion};
use spikex_timing::{MonotonicClock, StageTimer};
use spikex_transform::Pipeline;
use tracing::{debug, info};

use crate::aggregator::SpikeAggregator;
use crate::config::{EpochNames, ExtractionConfig, Modality};
use crate::error::{ConfigError, ExtractError};
use crate::matcher::{ParameterCursors, ParameterMatcher};
use crate::windower::{Cursor, StimulusWindower, TrialRange, trial_range, trial_ranges};

/// Turns a recording block into a [`Session`] of trials with spike counts.
///
/// The block is read on first use and kept for the lifetime of the
/// processor; call [`SessionProcessor::reload`] to read it again.
pub struct SessionProcessor<R: BlockReader> {
    reader: R,
    config: ExtractionConfig,
    pipeline: Pipeline,
    block: ReadCache<Block>,
    validated: bool,
    timer: StageTimer<MonotonicClock>,
}

impl<R: BlockReader> SessionProcessor<R> {
    pub fn new(reader: R, config: ExtractionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reader,
            config,
            pipeline: Pipeline::new(),
            block: ReadCache::new("block"),
            validated: false,
            timer: StageTimer::default(),
        })
    }

    /// Post-processing applied to both count matrices of every included trial
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn timer(&self) -> &StageTimer<MonotonicClock> {
        &self.timer
    }

    pub fn parameter_summary(&self) -> String {
        self.config.parameter_summary(&self.reader.describe())
    }

    pub fn reload(&mut self) {
        self.block.invalidate();
        self.validated = false;
    }

    /// Runs every trial of the block in order, sharing cursors between
    /// consecutive trials.
    pub fn extract(&mut self, exclusions: &[TrialExclusion]) -> Result<Session, ExtractError> {
        let Self {
            reader,
            config,
            pipeline,
            block,
            validated,
            timer,
        } = self;
        let block = load_block(reader, block, timer)?;
        let sweep = Sweep::new(block, config, pipeline)?;
        if config.validate_streams && !*validated {
            timer.time("validate streams", || sweep.validate())?;
            *validated = true;
        }

        let ranges = trial_ranges(sweep.trials, config.trial_window)?;
        let session = timer.time("extract trials", || {
            let mut cursors = SweepCursors::default();
            let mut trials = Vec::with_capacity(ranges.len());
            for range in &ranges {
                let (trial, next) = sweep.trial(range, cursors, exclusions)?;
                cursors = next;
                trials.push(trial);
            }
            Ok::<_, ExtractError>(Session::new(trials))
        })?;

        info!(
            trials = session.trial_count(),
            excluded = session.excluded().count(),
            "extracted session"
        );
        Ok(session)
    }

    /// Processes the trial at `index` on its own, with cursors found by
    /// binary search instead of carried over from earlier trials.
    pub fn extract_trial(
        &mut self,
        index: usize,
        exclusions: &[TrialExclusion],
    ) -> Result<Trial, ExtractError> {
        let Self {
            reader,
            config,
            pipeline,
            block,
            validated,
            timer,
        } = self;
        let block = load_block(reader, block, timer)?;
        let sweep = Sweep::new(block, config, pipeline)?;
        if config.validate_streams && !*validated {
            timer.time("validate streams", || sweep.validate())?;
            *validated = true;
        }

        let range = trial_range(sweep.trials, index, config.trial_window)?;
        let cursors = sweep.seek(&range);
        let (trial, _) = sweep.trial(&range, cursors, exclusions)?;
        Ok(trial)
    }
}

fn load_block<'a, R: BlockReader>(
    reader: &R,
    cache: &'a mut ReadCache<Block>,
    timer: &mut StageTimer<MonotonicClock>,
) -> Result<&'a Block, ExtractError> {
    cache.get_or_try_load(|| {
        timer.time("read block", || {
            reader
                .read()
                .map_err(|e| ExtractError::BlockRead(Box::new(e)))
        })
    })
}

/// Positions of every stream cursor between two trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SweepCursors {
    stimulus: Cursor,
    parameters: ParameterCursors,
    spikes: Cursor,
}

/// Streams and stages resolved from one block for one run
struct Sweep<'a> {
    config: &'a ExtractionConfig,
    pipeline: &'a Pipeline,
    trials: &'a EventStream,
    windower: StimulusWindower<'a>,
    parameters: ParameterMatcher<'a>,
    spikes: &'a SpikeStream,
    aggregator: SpikeAggregator,
}

impl<'a> Sweep<'a> {
    fn new(
        block: &'a Block,
        config: &'a ExtractionConfig,
        pipeline: &'a Pipeline,
    ) -> Result<Self, ExtractError> {
        let epochs = &config.epochs;
        Ok(Self {
            config,
            pipeline,
            trials: block.epoch(&EpochNames::atom(&epochs.trial))?,
            windower: StimulusWindower::new(block.epoch(&EpochNames::atom(&epochs.stimulus))?),
            parameters: ParameterMatcher::new(block, config),
            spikes: block.snip(&EpochNames::atom(&epochs.spikes))?,
            aggregator: SpikeAggregator::from_config(config),
        })
    }

    fn validate(&self) -> Result<(), ExtractError> {
        self.trials.check_monotonic()?;
        self.windower.stream().check_monotonic()?;
        self.parameters.check_monotonic()?;
        self.spikes.check_monotonic()?;
        Ok(())
    }

    fn seek(&self, range: &TrialRange) -> SweepCursors {
        let stimuli = self.windower.stream();
        let stimulus = Cursor(stimuli.seek(range.start));
        let anchor = stimuli.onset(stimulus.0).unwrap_or(range.start);
        SweepCursors {
            stimulus,
            parameters: self.parameters.seek(range.start),
            spikes: Cursor(self.spikes.seek(anchor + self.config.in_window.start())),
        }
    }

    fn trial(
        &self,
        range: &TrialRange,
        mut cursors: SweepCursors,
        exclusions: &[TrialExclusion],
    ) -> Result<(Trial, SweepCursors), ExtractError> {
        let window = self.windower.window(range, &mut cursors.stimulus);
        let mut stimuli = Vec::with_capacity(window.len());
        for event in &self.windower.stream().events()[window] {
            let offset = event
                .offset
                .unwrap_or(event.onset + self.config.tone_duration());
            stimuli.push(Stimulus {
                timing: StimulusTiming::new(
                    event.onset,
                    offset,
                    self.config.inter_tone_interval(),
                    range.start,
                ),
                parameters: self.parameters.parameters(event.onset, &mut cursors.parameters),
            });
        }

        let (modality, trials_type) = match self.config.modality {
            Modality::Acoustic => (
                TrialModality::Acoustic(AcousticSummary::from_stimuli(&stimuli)),
                ExclusionTrialsType::AcousticTrials,
            ),
            Modality::Electrical => (
                TrialModality::Electrical,
                ExclusionTrialsType::ElectricalTrials,
            ),
        };

        let exclusion = exclusions.iter().find(|e| {
            e.applies_to(ExclusionDataType::NeuralData, trials_type) && e.covers(range.onset)
        });
        let outcome = match exclusion {
            Some(exclusion) => {
                debug!(trial = range.trial_number, reason = %exclusion.reason, "trial excluded");
                TrialOutcome::Excluded {
                    reason: exclusion.reason.clone(),
                }
            }
            None => {
                let trial_number = range.trial_number;
                let (in_counts, out_counts) = self
                    .aggregator
                    .aggregate(&stimuli, self.spikes, &mut cursors.spikes)
                    .map_err(|source| ExtractError::Trial {
                        trial_number,
                        source,
                    })?;
                let transform = |m: CountMatrix| {
                    self.pipeline
                        .apply(m)
                        .map_err(|source| ExtractError::Transform {
                            trial_number,
                            source,
                        })
                };
                TrialOutcome::Included {
                    in_counts: transform(in_counts)?,
                    out_counts: transform(out_counts)?,
                }
            }
        };

        debug!(
            trial = range.trial_number,
            stimuli = stimuli.len(),
            %range.start,
            "processed trial"
        );
        let trial = Trial {
            trial_number: range.trial_number,
            start: range.start,
            end: range.end,
            stimuli,
            modality,
            outcome,
        };
        Ok((trial, cursors))
    }
}
