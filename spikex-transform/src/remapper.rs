use std::fs;
use std::path::{Path, PathBuf};

use spikex_core::CountMatrix;
use tracing::info;

use crate::channel_map::ChannelMap;
use crate::error::{ChannelMapError, TransformError};
use crate::pipeline::CountTransform;

pub const DEFAULT_MAP_FILE_PREFIX: &str = "channel map";

/// Reorders channel columns of a count matrix according to a [`ChannelMap`]
#[derive(Debug, Clone)]
pub struct ChannelRemapper {
    map: ChannelMap,
}

impl ChannelRemapper {
    pub fn new(map: ChannelMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &ChannelMap {
        &self.map
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChannelMapError> {
        ChannelMap::from_path(path).map(Self::new)
    }

    /// Loads the first file in `dir` whose name starts with `prefix`
    /// (case-insensitive). `Ok(None)` when there is no such file.
    pub fn from_autofind_in_path(
        dir: impl AsRef<Path>,
        prefix: &str,
    ) -> Result<Option<Self>, ChannelMapError> {
        let dir = dir.as_ref();
        let Some(path) = find_map_file(dir, prefix)? else {
            return Ok(None);
        };
        info!(
            "Loading channel mappings from {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        Self::from_path(&path).map(Some)
    }
}

fn find_map_file(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, ChannelMapError> {
    let io = |source: std::io::Error| ChannelMapError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let prefix = prefix.to_lowercase();
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if entry.file_type().map_err(io)?.is_file() && name.starts_with(&prefix) {
            candidates.push(entry.path());
        }
    }
    // read_dir order is platform dependent
    candidates.sort();
    Ok(candidates.into_iter().next())
}

impl CountTransform for ChannelRemapper {
    fn name(&self) -> &'static str {
        "channel remap"
    }

    fn transform(&self, matrix: &CountMatrix) -> Result<CountMatrix, TransformError> {
        if matrix.channels() != self.map.len() {
            return Err(TransformError::ShapeMismatch {
                stage: self.name(),
                got: matrix.channels(),
                expected: self.map.len(),
            });
        }
        Ok(matrix.permute_channels(self.map.source_for_column()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn remapper(pairs: Vec<(u16, u16)>) -> ChannelRemapper {
        ChannelRemapper::new(ChannelMap::new(pairs).unwrap())
    }

    #[test]
    fn remaps_correctly_with_valid_map() {
        let m = CountMatrix::from_rows(&[vec![100, 300, 500], vec![200, 400, 600]]).unwrap();
        let out = remapper(vec![(1, 2), (2, 1), (3, 3)]).transform(&m).unwrap();
        assert_eq!(out.to_rows(), vec![vec![300, 100, 500], vec![400, 200, 600]]);
    }

    #[test]
    fn destination_column_takes_source_column() {
        let m = CountMatrix::from_rows(&[vec![10, 20, 30, 40]]).unwrap();
        let out = remapper(vec![(1, 3), (2, 4), (3, 1), (4, 2)])
            .transform(&m)
            .unwrap();
        // out[:, dst-1] == in[:, src-1]
        assert_eq!(out.to_rows(), vec![vec![30, 40, 10, 20]]);
    }

    #[test]
    fn inverse_restores_columns() {
        let m = CountMatrix::from_rows(&[vec![1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10]]).unwrap();
        let map = ChannelMap::new(vec![(1, 4), (2, 1), (3, 5), (4, 2), (5, 3)]).unwrap();
        let there = ChannelRemapper::new(map.clone()).transform(&m).unwrap();
        assert_ne!(there, m);
        let back = ChannelRemapper::new(map.inverse()).transform(&there).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rejects_matrix_of_wrong_width() {
        let m = CountMatrix::zeros(2, 4);
        let err = remapper(vec![(1, 2), (2, 1), (3, 3)]).transform(&m).unwrap_err();
        assert_eq!(
            err,
            TransformError::ShapeMismatch {
                stage: "channel remap",
                got: 4,
                expected: 3
            }
        );
    }

    #[test]
    fn autofind_matches_prefix_case_insensitively() {
        for name in ["channel map.txt", "Channel map.txt", "Channel Mapping.txt"] {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("notes.txt"), "irrelevant").unwrap();
            fs::write(dir.path().join(name), "TDT\tMapping\n1\t2\n2\t1\n").unwrap();
            let found = ChannelRemapper::from_autofind_in_path(dir.path(), DEFAULT_MAP_FILE_PREFIX)
                .unwrap()
                .expect("map file should be found");
            assert_eq!(found.map().pairs(), &[(1, 2), (2, 1)]);
        }
    }

    #[test]
    fn autofind_returns_none_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("not_valid_map_name.txt"), "TDT\tMapping\n").unwrap();
        let found =
            ChannelRemapper::from_autofind_in_path(dir.path(), DEFAULT_MAP_FILE_PREFIX).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn autofind_surfaces_invalid_map() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("channel map.txt"), "TDT\tMapping\n1\t1\n2\t1\n").unwrap();
        let err = ChannelRemapper::from_autofind_in_path(dir.path(), DEFAULT_MAP_FILE_PREFIX)
            .unwrap_err();
        assert!(matches!(err, ChannelMapError::Invalid(_)));
    }
}
