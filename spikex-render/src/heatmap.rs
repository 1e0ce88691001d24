use std::path::{Path, PathBuf};

use spikex_core::CountMatrix;
use thiserror::Error;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot render a {stimuli}x{channels} matrix")]
    Empty { stimuli: usize, channels: usize },

    #[error("heatmap of {width}x{height} px is too large")]
    TooLarge { width: u64, height: u64 },

    #[error("failed to write {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Maps `value` onto a dark-to-bright ramp scaled to `max`
pub fn heat_color(value: u32, max: u32) -> Color {
    let t = if max == 0 {
        0.0
    } else {
        (value as f32 / max as f32).clamp(0.0, 1.0)
    };
    // black -> red -> yellow -> white
    let r = (t * 3.0).min(1.0);
    let g = (t * 3.0 - 1.0).clamp(0.0, 1.0);
    let b = (t * 3.0 - 2.0).clamp(0.0, 1.0);
    Color::from_rgba(r, g, b, 1.0).unwrap_or(Color::BLACK)
}

/// Draws one cell per `[stimulus][channel]`, stimuli as rows and channels as
/// columns, coloured relative to the matrix maximum.
#[derive(Debug, Clone, Copy)]
pub struct HeatmapRenderer {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Pixels between cells, filled with `background`
    pub gap: u32,
    pub background: Color,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            cell_width: 16,
            cell_height: 16,
            gap: 1,
            background: Color::from_rgba8(40, 40, 40, 255),
        }
    }
}

impl HeatmapRenderer {
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Self::default()
        }
    }

    /// Pixel size of the heatmap for a matrix of the given shape
    pub fn dimensions(&self, stimuli: usize, channels: usize) -> (u64, u64) {
        let span =
            |cells: usize, size: u32| cells as u64 * (size + self.gap) as u64 + self.gap as u64;
        (span(channels, self.cell_width), span(stimuli, self.cell_height))
    }

    pub fn render(&self, matrix: &CountMatrix) -> Result<Pixmap, RenderError> {
        let (stimuli, channels) = matrix.shape();
        if stimuli == 0 || channels == 0 || self.cell_width == 0 || self.cell_height == 0 {
            return Err(RenderError::Empty { stimuli, channels });
        }
        let (width, height) = self.dimensions(stimuli, channels);
        let too_large = RenderError::TooLarge { width, height };
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(too_large);
        };
        let mut pixmap = Pixmap::new(w, h).ok_or(too_large)?;
        pixmap.fill(self.background);

        let max = matrix.max();
        let mut paint = Paint::default();
        for row in 0..stimuli {
            for col in 0..channels {
                let value = matrix.get(row, col).unwrap_or(0);
                paint.set_color(heat_color(value, max));
                let x = self.gap + col as u32 * (self.cell_width + self.gap);
                let y = self.gap + row as u32 * (self.cell_height + self.gap);
                if let Some(rect) = Rect::from_xywh(
                    x as f32,
                    y as f32,
                    self.cell_width as f32,
                    self.cell_height as f32,
                ) {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
        }
        Ok(pixmap)
    }

    pub fn save_png(
        &self,
        matrix: &CountMatrix,
        path: impl AsRef<Path>,
    ) -> Result<(), RenderError> {
        let path = path.as_ref();
        self.render(matrix)?
            .save_png(path)
            .map_err(|e| RenderError::Encode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}
