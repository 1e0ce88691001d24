//! Count matrix heatmaps for quick visual inspection of extracted trials.

pub mod heatmap;

pub use heatmap::{HeatmapRenderer, RenderError, heat_color};
