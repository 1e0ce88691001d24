use std::collections::HashMap;

use spikex_cache::{EpochName, epoch_name};

use crate::error::CoreError;
use crate::stream::{EventStream, SpikeStream};

/// Decoded contents of a recording block: named epoch stores and spike
/// snippet stores.
#[derive(Debug, Clone, Default)]
pub struct Block {
    epochs: HashMap<EpochName, EventStream>,
    snips: HashMap<EpochName, SpikeStream>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epoch(mut self, stream: EventStream) -> Self {
        self.insert_epoch(stream);
        self
    }

    pub fn with_snip(mut self, stream: SpikeStream) -> Self {
        self.insert_snip(stream);
        self
    }

    pub fn insert_epoch(&mut self, stream: EventStream) {
        self.epochs.insert(epoch_name(&stream.name), stream);
    }

    pub fn insert_snip(&mut self, stream: SpikeStream) {
        self.snips.insert(epoch_name(&stream.name), stream);
    }

    pub fn epoch(&self, name: &EpochName) -> Result<&EventStream, CoreError> {
        self.epochs.get(name).ok_or_else(|| CoreError::MissingStream {
            kind: "epoch",
            name: name.clone(),
        })
    }

    /// Like [`Block::epoch`] but for stores that are allowed to be absent
    pub fn optional_epoch(&self, name: &EpochName) -> Option<&EventStream> {
        self.epochs.get(name)
    }

    pub fn snip(&self, name: &EpochName) -> Result<&SpikeStream, CoreError> {
        self.snips.get(name).ok_or_else(|| CoreError::MissingStream {
            kind: "snip",
            name: name.clone(),
        })
    }

    pub fn epoch_names(&self) -> impl Iterator<Item = &EpochName> {
        self.epochs.keys()
    }

    pub fn snip_names(&self) -> impl Iterator<Item = &EpochName> {
        self.snips.keys()
    }
}

/// Reads a recording block. Implemented by whatever decodes the acquisition
/// format; the extractor only ever calls it once per run.
pub trait BlockReader {
    type Error: std::error::Error + Send + Sync + 'static;

    fn read(&self) -> Result<Block, Self::Error>;

    /// Human readable origin of the block, used in logs and summaries
    fn describe(&self) -> String {
        String::from("<block>")
    }
}
