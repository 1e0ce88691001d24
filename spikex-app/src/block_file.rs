use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spikex_core::{Block, BlockReader, CoreError, EventStream, SpikeStream};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BlockFileError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: {source}")]
    Stream {
        path: PathBuf,
        #[source]
        source: CoreError,
    },
}

/// One epoch store as aligned columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochColumns {
    pub onset: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offset: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<f64>,
}

/// One spike snippet store as aligned columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnipColumns {
    pub timestamps: Vec<f64>,
    pub channels: Vec<u16>,
}

/// On-disk layout of a block export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockExport {
    #[serde(default)]
    pub epochs: BTreeMap<String, EpochColumns>,
    #[serde(default)]
    pub snips: BTreeMap<String, SnipColumns>,
}

impl BlockExport {
    pub fn into_block(self) -> Result<Block, CoreError> {
        let mut block = Block::new();
        for (name, c) in self.epochs {
            block.insert_epoch(EventStream::from_parts(name, &c.onset, &c.offset, &c.data)?);
        }
        for (name, c) in self.snips {
            block.insert_snip(SpikeStream::from_parts(name, &c.timestamps, &c.channels)?);
        }
        Ok(block)
    }

    pub fn write(&self, path: &Path) -> Result<(), BlockFileError> {
        let file = File::create(path).map_err(|source| BlockFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer(&mut w, self).map_err(|source| BlockFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        w.flush().map_err(|source| BlockFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Block export stored as JSON
#[derive(Debug, Clone)]
pub struct JsonBlockFile {
    path: PathBuf,
}

impl JsonBlockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockReader for JsonBlockFile {
    type Error = BlockFileError;

    fn read(&self) -> Result<Block, BlockFileError> {
        let file = File::open(&self.path).map_err(|source| BlockFileError::Io {
            path: self.path.clone(),
            source,
        })?;
        let export: BlockExport =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| BlockFileError::Json {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            path = %self.path.display(),
            epochs = export.epochs.len(),
            snips = export.snips.len(),
            "read block export"
        );
        export.into_block().map_err(|source| BlockFileError::Stream {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
