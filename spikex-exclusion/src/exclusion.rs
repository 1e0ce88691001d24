//! Trial exclusion files.
//!
//! Free-form text files placed next to (or above) a recording. Lines of the
//! form `Exclude after: 5700s` and `Exclude before: 9500s` bound the excluded
//! part of the recording; everything else is the reason, kept verbatim.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use spikex_core::Timestamp;
use tracing::{debug, warn};

use crate::error::ExclusionError;
use crate::filename::{ExclusionDataType, ExclusionTrialsType, FilenameClass, classify_filename};

pub const DEFAULT_EXCLUSION_FILE_PREFIX: &str = "exclude";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialExclusion {
    pub data_types: BTreeSet<ExclusionDataType>,
    pub trials_types: BTreeSet<ExclusionTrialsType>,
    /// Block time from which trials are excluded
    pub start_offset: Timestamp,
    /// Block time until which trials are excluded; open ended when absent
    pub end_offset: Option<Timestamp>,
    pub reason: String,
}

/// Parses `<keyword> <digits>` at the start of `line`, case-insensitively,
/// with at least one space after the keyword. A trailing `s` unit is
/// required when `unit_required` is set.
fn parse_directive(line: &str, keyword: &str, unit_required: bool) -> Option<f64> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    let value = rest.trim_start();
    if value.len() == rest.len() {
        return None;
    }
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    if digits_end == 0 {
        return None;
    }
    let has_unit = value[digits_end..].starts_with(['s', 'S']);
    if unit_required && !has_unit {
        return None;
    }
    value[..digits_end].parse().ok()
}

impl TrialExclusion {
    pub fn from_reader(
        reader: impl BufRead,
        data_types: BTreeSet<ExclusionDataType>,
        trials_types: BTreeSet<ExclusionTrialsType>,
    ) -> Result<Self, ExclusionError> {
        let mut start_offset = None;
        let mut end_offset = None;
        let mut reason = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ExclusionError::Io {
                path: PathBuf::from("<reader>"),
                source,
            })?;
            if let Some(after) = parse_directive(&line, "exclude after:", false) {
                if start_offset.replace(Timestamp(after)).is_some() {
                    return Err(ExclusionError::MultipleExcludeAfter { line: i + 1 });
                }
                continue;
            }
            if let Some(before) = parse_directive(&line, "exclude before:", true) {
                if end_offset.replace(Timestamp(before)).is_some() {
                    return Err(ExclusionError::MultipleExcludeBefore { line: i + 1 });
                }
                continue;
            }
            reason.push(line);
        }

        Ok(Self {
            data_types,
            trials_types,
            start_offset: start_offset.unwrap_or_default(),
            end_offset,
            reason: reason.join("\n").trim().to_string(),
        })
    }

    /// Reads an exclusion file, classifying it by name. Files meant for other
    /// tools or with unrecognised names yield `Ok(None)`.
    pub fn from_path(path: &Path, prefix: &str) -> Result<Option<Self>, ExclusionError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (data_types, trials_types) = match classify_filename(&file_name, prefix) {
            FilenameClass::Applies {
                data_types,
                trials_types,
            } => (data_types, trials_types),
            FilenameClass::OtherTool => {
                debug!("Skipping exclusion for another tool: {}", path.display());
                return Ok(None);
            }
            FilenameClass::Unknown => {
                warn!("Unknown exclusion type: {}", path.display());
                return Ok(None);
            }
        };

        let file = File::open(path).map_err(|source| ExclusionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), data_types, trials_types).map(Some)
    }

    /// Collects exclusions from `dir` and every directory above it
    pub fn from_autofind_in_path(dir: &Path, prefix: &str) -> Result<Vec<Self>, ExclusionError> {
        let lower_prefix = prefix.to_lowercase();
        let mut exclusions = Vec::new();
        let mut files_by_data_type: BTreeMap<ExclusionDataType, Vec<String>> = BTreeMap::new();

        // a relative `dir` ends its ancestors with an empty path
        for d in dir.ancestors().filter(|d| !d.as_os_str().is_empty()) {
            let io = |source: std::io::Error| ExclusionError::Io {
                path: d.to_path_buf(),
                source,
            };
            let mut files = Vec::new();
            for entry in fs::read_dir(d).map_err(io)? {
                let entry = entry.map_err(io)?;
                let name = entry.file_name().to_string_lossy().to_lowercase();
                if entry.file_type().map_err(io)?.is_file() && name.starts_with(&lower_prefix) {
                    files.push(entry.path());
                }
            }
            files.sort();

            for f in files {
                if let Some(exclusion) = Self::from_path(&f, prefix)? {
                    for data_type in &exclusion.data_types {
                        files_by_data_type
                            .entry(*data_type)
                            .or_default()
                            .push(f.display().to_string());
                    }
                    exclusions.push(exclusion);
                }
            }
        }

        for (data_type, files) in &files_by_data_type {
            if files.len() > 1 {
                warn!(
                    "More than one exclusion file for data type {data_type:?}: {}",
                    files.join(", ")
                );
            }
        }

        Ok(exclusions)
    }

    pub fn applies_to(
        &self,
        data_type: ExclusionDataType,
        trials_type: ExclusionTrialsType,
    ) -> bool {
        self.data_types.contains(&data_type) && self.trials_types.contains(&trials_type)
    }

    /// Whether `ts` falls inside `[start_offset, end_offset)`
    pub fn covers(&self, ts: Timestamp) -> bool {
        ts >= self.start_offset && self.end_offset.is_none_or(|end| ts < end)
    }
}
