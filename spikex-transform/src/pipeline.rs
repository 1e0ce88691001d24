use spikex_core::CountMatrix;
use tracing::trace;

use crate::error::TransformError;

/// A post-processing stage: takes a count matrix and returns a new one of
/// the same shape and meaning.
pub trait CountTransform: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn transform(&self, matrix: &CountMatrix) -> Result<CountMatrix, TransformError>;
}

/// Stages applied in insertion order
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn CountTransform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: impl CountTransform + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn with(mut self, stage: impl CountTransform + 'static) -> Self {
        self.push(stage);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn apply(&self, matrix: CountMatrix) -> Result<CountMatrix, TransformError> {
        self.stages.iter().try_fold(matrix, |m, stage| {
            trace!(stage = stage.name(), "applying transform");
            stage.transform(&m)
        })
    }
}
