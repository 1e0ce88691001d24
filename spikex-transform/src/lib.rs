//! Post-processing applied to count matrices after aggregation.

pub mod channel_map;
pub mod error;
pub mod pipeline;
pub mod remapper;

pub use channel_map::{ChannelMap, MapViolation};
pub use error::{ChannelMapError, TransformError};
pub use pipeline::{CountTransform, Pipeline};
pub use remapper::{ChannelRemapper, DEFAULT_MAP_FILE_PREFIX};
