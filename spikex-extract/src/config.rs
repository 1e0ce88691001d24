use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spikex_cache::{EpochName, epoch_name};
use spikex_core::RelativeTimestamp;

use crate::error::{ConfigError, ExtractError};

/// Span relative to a reference point, `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureWindow {
    pub start: f64,
    pub end: f64,
}

impl CaptureWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> RelativeTimestamp {
        RelativeTimestamp(self.start)
    }

    pub fn end(&self) -> RelativeTimestamp {
        RelativeTimestamp(self.end)
    }
}

/// Offsets applied to each trial marker onset; `from` may be negative to
/// include activity before the marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialWindow {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Acoustic,
    Electrical,
}

/// Store names in the recording block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochNames {
    pub trial: String,
    pub stimulus: String,
    pub attenuation: String,
    pub acoustic_frequency: String,
    pub reference_channels_bitmask: String,
    pub stimulation_channels_bitmask: String,
    pub stimulation_current: String,
    pub stimulation_frequency: String,
    pub spikes: String,
}

impl Default for EpochNames {
    fn default() -> Self {
        Self {
            trial: "TriS".into(),
            stimulus: "StiS".into(),
            attenuation: "Attn".into(),
            acoustic_frequency: "AFrq".into(),
            reference_channels_bitmask: "ReBM".into(),
            stimulation_channels_bitmask: "StBM".into(),
            stimulation_current: "Curr".into(),
            stimulation_frequency: "Freq".into(),
            spikes: "CSPK".into(),
        }
    }
}

impl EpochNames {
    pub fn atom(name: &str) -> EpochName {
        epoch_name(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Seconds each stimulus lasts
    pub tone_duration: f64,
    /// Seconds of silence after each stimulus
    pub inter_tone_interval: f64,
    /// Relative to stimulus onset
    pub in_window: CaptureWindow,
    /// Relative to stimulus onset plus `tone_duration`
    pub out_window: CaptureWindow,
    /// Max onset difference for events on two streams to count as simultaneous
    pub tolerance: f64,
    pub channel_count: usize,
    pub trial_window: TrialWindow,
    pub epochs: EpochNames,
    pub modality: Modality,
    /// Check every stream is time-ordered before sweeping it
    pub validate_streams: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tone_duration: 0.25,
            inter_tone_interval: 0.25,
            in_window: CaptureWindow::new(0.0, 0.2),
            out_window: CaptureWindow::new(0.1, 0.25),
            tolerance: 0.001,
            channel_count: 32,
            trial_window: TrialWindow { from: 0.0, to: 10.0 },
            epochs: EpochNames::default(),
            modality: Modality::Acoustic,
            validate_streams: true,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial_window.to <= self.trial_window.from {
            return Err(ConfigError::TrialWindow {
                from: self.trial_window.from,
                to: self.trial_window.to,
            });
        }
        for (which, w) in [("in", self.in_window), ("out", self.out_window)] {
            if w.end <= w.start {
                return Err(ConfigError::CaptureWindow {
                    which,
                    start: w.start,
                    end: w.end,
                });
            }
        }
        // NaN fails this too
        if !(self.tolerance > 0.0) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        for (field, value) in [
            ("tone_duration", self.tone_duration),
            ("inter_tone_interval", self.inter_tone_interval),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeDuration { field, value });
            }
        }
        if self.channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }
        Ok(())
    }

    /// Loads a JSON config; fields left out keep their defaults. The result
    /// is not validated, callers apply their overrides and then `validate`
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let config_file = |source: Box<dyn std::error::Error + Send + Sync>| {
            ExtractError::ConfigFile {
                path: path.to_path_buf(),
                source,
            }
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_file(Box::new(e)))?;
        serde_json::from_str(&text).map_err(|e| config_file(Box::new(e)))
    }

    pub fn tone_duration(&self) -> RelativeTimestamp {
        RelativeTimestamp(self.tone_duration)
    }

    pub fn inter_tone_interval(&self) -> RelativeTimestamp {
        RelativeTimestamp(self.inter_tone_interval)
    }

    pub fn tolerance(&self) -> RelativeTimestamp {
        RelativeTimestamp(self.tolerance)
    }

    /// Multi-section, human readable listing of the settings in effect
    pub fn parameter_summary(&self, block: &str) -> String {
        let e = &self.epochs;
        let sections: [(&str, Vec<(&str, String)>); 5] = [
            (
                "Tones",
                vec![
                    ("Tone Duration", self.tone_duration.to_string()),
                    ("Inter Tone Interval", self.inter_tone_interval.to_string()),
                    ("Modality", format!("{:?}", self.modality)),
                ],
            ),
            (
                "Offsets",
                vec![
                    (
                        "Trial Window",
                        format!("{} .. {}", self.trial_window.from, self.trial_window.to),
                    ),
                    ("In Tone Capture Start Offset", self.in_window.start.to_string()),
                    ("In Tone Capture End Offset", self.in_window.end.to_string()),
                    ("Out Tone Capture Start Offset", self.out_window.start.to_string()),
                    ("Out Tone Capture End Offset", self.out_window.end.to_string()),
                    ("Tolerance", self.tolerance.to_string()),
                ],
            ),
            (
                "Epochs",
                vec![
                    ("Trial Epoch", e.trial.clone()),
                    ("Stimulus Epoch", e.stimulus.clone()),
                    ("Attenuation Epoch", e.attenuation.clone()),
                    ("Acoustic Frequency Epoch", e.acoustic_frequency.clone()),
                    ("Reference Channels Bitmask Epoch", e.reference_channels_bitmask.clone()),
                    ("Stimulation Channels Bitmask Epoch", e.stimulation_channels_bitmask.clone()),
                    ("Stimulation Current Epoch", e.stimulation_current.clone()),
                    ("Stimulation Frequency Epoch", e.stimulation_frequency.clone()),
                    ("Spike Snips", e.spikes.clone()),
                ],
            ),
            (
                "Channels",
                vec![("Channel Count", self.channel_count.to_string())],
            ),
            ("Block", vec![("Block Path", block.to_string())]),
        ];

        let mut out = String::new();
        for (heading, fields) in sections {
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", heading.to_uppercase());
            let _ = writeln!(out, "{}", "-".repeat(heading.len()));
            for (label, value) in fields {
                let _ = writeln!(out, "{label}: {value}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = ExtractionConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.channel_count, 32);
        assert_eq!(c.epochs.trial, "TriS");
    }

    #[test]
    fn rejects_inverted_windows() {
        let mut c = ExtractionConfig::default();
        c.trial_window = TrialWindow { from: 1.0, to: 1.0 };
        assert!(matches!(c.validate(), Err(ConfigError::TrialWindow { .. })));

        let mut c = ExtractionConfig::default();
        c.out_window = CaptureWindow::new(0.3, 0.1);
        assert_eq!(
            c.validate(),
            Err(ConfigError::CaptureWindow {
                which: "out",
                start: 0.3,
                end: 0.1
            })
        );
    }

    #[test]
    fn rejects_bad_scalars() {
        let mut c = ExtractionConfig::default();
        c.tolerance = 0.0;
        assert_eq!(c.validate(), Err(ConfigError::Tolerance(0.0)));
        c.tolerance = f64::NAN;
        assert!(matches!(c.validate(), Err(ConfigError::Tolerance(_))));

        let mut c = ExtractionConfig::default();
        c.channel_count = 0;
        assert_eq!(c.validate(), Err(ConfigError::NoChannels));

        let mut c = ExtractionConfig::default();
        c.tone_duration = -0.1;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::NegativeDuration { field: "tone_duration", .. })
        ));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: ExtractionConfig = serde_json::from_str(
            r#"{ "channel_count": 16, "epochs": { "spikes": "eNe1" }, "modality": "electrical" }"#,
        )
        .unwrap();
        assert_eq!(c.channel_count, 16);
        assert_eq!(c.epochs.spikes, "eNe1");
        assert_eq!(c.epochs.trial, "TriS");
        assert_eq!(c.modality, Modality::Electrical);
        assert_eq!(c.in_window, CaptureWindow::new(0.0, 0.2));
    }

    #[test]
    fn summary_lists_every_section() {
        let s = ExtractionConfig::default().parameter_summary("/data/block-1");
        for heading in ["TONES\n-----", "OFFSETS", "EPOCHS", "CHANNELS", "BLOCK"] {
            assert!(s.contains(heading), "missing {heading} in\n{s}");
        }
        assert!(s.contains("Trial Epoch: TriS"));
        assert!(s.contains("Block Path: /data/block-1"));
    }

    #[test]
    fn loading_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "trial_window": { "from": 5.0, "to": 1.0 } }"#).unwrap();

        let c = ExtractionConfig::from_json_path(&path).unwrap();
        assert_eq!(c.trial_window, TrialWindow { from: 5.0, to: 1.0 });
        assert!(matches!(c.validate(), Err(ConfigError::TrialWindow { .. })));
    }

    #[test]
    fn load_errors_keep_their_source() {
        use std::error::Error as _;

        let dir = tempfile::tempdir().unwrap();
        let missing = ExtractionConfig::from_json_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ExtractError::ConfigFile { .. }));
        let io = missing.source().unwrap();
        assert!(io.downcast_ref::<std::io::Error>().is_some());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"channel_count\": ").unwrap();
        let broken = ExtractionConfig::from_json_path(&path).unwrap_err();
        let json = broken.source().unwrap();
        assert!(json.downcast_ref::<serde_json::Error>().is_some());
        assert!(broken.to_string().contains("broken.json"));
    }
}
