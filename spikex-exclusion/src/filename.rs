use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExclusionDataType {
    NeuralData,
    HrData,
}

impl ExclusionDataType {
    pub const ALL: [Self; 2] = [Self::NeuralData, Self::HrData];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExclusionTrialsType {
    AcousticTrials,
    ElectricalTrials,
}

impl ExclusionTrialsType {
    pub const ALL: [Self; 2] = [Self::AcousticTrials, Self::ElectricalTrials];
}

/// What an exclusion file applies to, decided from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameClass {
    Applies {
        data_types: BTreeSet<ExclusionDataType>,
        trials_types: BTreeSet<ExclusionTrialsType>,
    },
    /// Exclusion for another tool, ignored quietly
    OtherTool,
    Unknown,
}

/// Classifies an exclusion file name such as
/// `exclude from results aggregation - electrical.txt`.
///
/// `prefix` is stripped (case-insensitively) along with a `.txt` suffix and
/// the remainder decides what the exclusion covers.
pub fn classify_filename(file_name: &str, prefix: &str) -> FilenameClass {
    let lower = file_name.to_lowercase();
    let Some(remainder) = lower.strip_prefix(&prefix.to_lowercase()) else {
        return FilenameClass::Unknown;
    };
    let remainder = remainder.strip_suffix(".txt").unwrap_or(remainder);

    let all_data = || ExclusionDataType::ALL.into_iter().collect();
    let all_trials = || ExclusionTrialsType::ALL.into_iter().collect();

    if remainder.is_empty() {
        FilenameClass::Applies {
            data_types: all_data(),
            trials_types: all_trials(),
        }
    } else if remainder.contains("neural data") {
        FilenameClass::Applies {
            data_types: BTreeSet::from([ExclusionDataType::NeuralData]),
            trials_types: all_trials(),
        }
    } else if remainder.contains("results aggregation - electrical")
        || remainder.contains("results aggregation - partial electrical")
    {
        FilenameClass::Applies {
            data_types: all_data(),
            trials_types: BTreeSet::from([ExclusionTrialsType::ElectricalTrials]),
        }
    } else if remainder.contains("results aggregation") {
        FilenameClass::Applies {
            data_types: all_data(),
            trials_types: all_trials(),
        }
    } else if ["cf saving", "bulk reprocessing", "map generation"]
        .iter()
        .any(|tool| remainder.contains(tool))
    {
        FilenameClass::OtherTool
    } else {
        FilenameClass::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "exclude";

    fn applies(name: &str) -> (Vec<ExclusionDataType>, Vec<ExclusionTrialsType>) {
        match classify_filename(name, PREFIX) {
            FilenameClass::Applies {
                data_types,
                trials_types,
            } => (
                data_types.into_iter().collect(),
                trials_types.into_iter().collect(),
            ),
            other => panic!("{name}: expected an applicable exclusion, got {other:?}"),
        }
    }

    #[test]
    fn neural_data_files() {
        for name in [
            "exclude from neural data.txt",
            "exclude from neural data - all.txt",
            "Exclude from Neural Data - partial.txt",
        ] {
            let (data, trials) = applies(name);
            assert_eq!(data, vec![ExclusionDataType::NeuralData]);
            assert_eq!(trials, ExclusionTrialsType::ALL.to_vec());
        }
    }

    #[test]
    fn full_exclusion_files() {
        for name in [
            "exclude.txt",
            "exclude from results aggregation.txt",
            "exclude from results aggregation - all.txt",
            "exclude from results aggregation - all with message.txt",
        ] {
            let (data, trials) = applies(name);
            assert_eq!(data, ExclusionDataType::ALL.to_vec());
            assert_eq!(trials, ExclusionTrialsType::ALL.to_vec());
        }
    }

    #[test]
    fn electrical_files() {
        for name in [
            "exclude from results aggregation - electrical.txt",
            "exclude from results aggregation - electrical with message.txt",
            "exclude from results aggregation - partial electrical with message.txt",
        ] {
            let (data, trials) = applies(name);
            assert_eq!(data, ExclusionDataType::ALL.to_vec());
            assert_eq!(trials, vec![ExclusionTrialsType::ElectricalTrials]);
        }
    }

    #[test]
    fn other_tools_and_unknown() {
        for name in [
            "exclude from cf saving.txt",
            "exclude bulk reprocessing.txt",
            "exclude from map generation.txt",
        ] {
            assert_eq!(classify_filename(name, PREFIX), FilenameClass::OtherTool);
        }
        assert_eq!(
            classify_filename("exclude some unknown type.txt", PREFIX),
            FilenameClass::Unknown
        );
        assert_eq!(classify_filename("notes.txt", PREFIX), FilenameClass::Unknown);
    }
}
