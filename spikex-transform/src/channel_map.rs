//! Validated channel permutations and the tab-separated map file format.
//!
//! A map file starts with a `TDT<TAB>Mapping` (or `TDT<TAB>Mapped`) header
//! followed by one `source<TAB>destination` pair per line.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::ChannelMapError;

const VALID_HEADERS: [[&str; 2]; 2] = [["TDT", "Mapping"], ["TDT", "Mapped"]];

/// One rule a channel map broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapViolation {
    DuplicateSource(Vec<u16>),
    DuplicateDestination(Vec<u16>),
    SourceExceedsMax { max: usize, channels: Vec<u16> },
    DestinationExceedsMax { max: usize, channels: Vec<u16> },
    ZeroChannel,
}

fn join(channels: &[u16]) -> String {
    channels
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for MapViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSource(c) => write!(
                f,
                "Provided channel map includes duplicate source channels: {}",
                join(c)
            ),
            Self::DuplicateDestination(c) => write!(
                f,
                "Provided channel map includes duplicate destination channels: {}",
                join(c)
            ),
            Self::SourceExceedsMax { max, channels } => write!(
                f,
                "One or more source channel numbers exceed max channel number ({max}): {}",
                join(channels)
            ),
            Self::DestinationExceedsMax { max, channels } => write!(
                f,
                "One or more destination channel numbers exceed max channel number ({max}): {}",
                join(channels)
            ),
            Self::ZeroChannel => write!(f, "Channel numbers start at 1, found channel 0"),
        }
    }
}

/// Bijection of channels `1..=n` onto themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    pairs: Vec<(u16, u16)>,
    /// For each output column, the input column it is copied from
    source_for_column: Vec<usize>,
}

/// Channels seen more than once, in first-seen order
fn duplicates(channels: impl Iterator<Item = u16>) -> Vec<u16> {
    let mut seen = BTreeSet::new();
    let mut dups = Vec::new();
    for c in channels {
        if !seen.insert(c) && !dups.contains(&c) {
            dups.push(c);
        }
    }
    dups
}

impl ChannelMap {
    /// Validates `pairs` of `(source, destination)` channel numbers.
    ///
    /// Every broken rule is collected before failing.
    pub fn new(pairs: Vec<(u16, u16)>) -> Result<Self, ChannelMapError> {
        let max = pairs.len();
        for (src, dst) in &pairs {
            debug!("Mapping source channel {src} to destination {dst}");
        }

        let mut violations = Vec::new();

        let dup_src = duplicates(pairs.iter().map(|p| p.0));
        if !dup_src.is_empty() {
            violations.push(MapViolation::DuplicateSource(dup_src));
        }
        let dup_dst = duplicates(pairs.iter().map(|p| p.1));
        if !dup_dst.is_empty() {
            violations.push(MapViolation::DuplicateDestination(dup_dst));
        }

        let over = |col: fn(&(u16, u16)) -> u16| -> Vec<u16> {
            pairs
                .iter()
                .map(col)
                .filter(|&c| c as usize > max)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        let src_over = over(|p| p.0);
        if !src_over.is_empty() {
            violations.push(MapViolation::SourceExceedsMax {
                max,
                channels: src_over,
            });
        }
        let dst_over = over(|p| p.1);
        if !dst_over.is_empty() {
            violations.push(MapViolation::DestinationExceedsMax {
                max,
                channels: dst_over,
            });
        }

        if pairs.iter().any(|&(s, d)| s == 0 || d == 0) {
            violations.push(MapViolation::ZeroChannel);
        }

        if !violations.is_empty() {
            return Err(ChannelMapError::Invalid(violations));
        }

        // Both columns are now known to be permutations of 1..=max.
        let mut source_for_column = vec![0; max];
        for &(src, dst) in &pairs {
            source_for_column[dst as usize - 1] = src as usize - 1;
        }

        Ok(Self {
            pairs,
            source_for_column,
        })
    }

    /// Number of channels covered by the map
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(u16, u16)] {
        &self.pairs
    }

    pub(crate) fn source_for_column(&self) -> &[usize] {
        &self.source_for_column
    }

    /// Map that undoes this one
    pub fn inverse(&self) -> Self {
        let pairs: Vec<_> = self.pairs.iter().map(|&(s, d)| (d, s)).collect();
        let mut source_for_column = vec![0; pairs.len()];
        for &(src, dst) in &pairs {
            source_for_column[dst as usize - 1] = src as usize - 1;
        }
        Self {
            pairs,
            source_for_column,
        }
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, ChannelMapError> {
        let mut lines = reader.lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line.map_err(|e| io_error(Path::new("<reader>"), e))?,
            None => String::new(),
        };
        let columns: Vec<&str> = header.trim().split('\t').collect();
        if !VALID_HEADERS.iter().any(|h| columns == h) {
            return Err(ChannelMapError::InvalidHeader(header));
        }

        let mut pairs = Vec::new();
        for (i, line) in lines {
            let line = line.map_err(|e| io_error(Path::new("<reader>"), e))?;
            let number = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let fields: Vec<&str> = trimmed.split('\t').collect();
            let [src, dst] = fields.as_slice() else {
                return Err(ChannelMapError::MalformedLine {
                    line: number,
                    content: line,
                });
            };
            pairs.push((parse_channel(src, number)?, parse_channel(dst, number)?));
        }

        Self::new(pairs)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChannelMapError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        Self::from_reader(BufReader::new(file))
    }
}

fn parse_channel(field: &str, line: usize) -> Result<u16, ChannelMapError> {
    field
        .trim()
        .parse()
        .map_err(|_| ChannelMapError::NotAChannel {
            line,
            field: field.to_string(),
        })
}

fn io_error(path: &Path, source: std::io::Error) -> ChannelMapError {
    ChannelMapError::Io {
        path: path.to_path_buf(),
        source,
    }
}
