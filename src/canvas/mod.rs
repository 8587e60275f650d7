pub mod colors;
pub mod figure;
pub mod png;
pub mod svg;

pub use figure::{descriptor_figure, signal_figure, Bounds, Figure, Series};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Turns a [`Figure`] into file bytes.
pub trait FigureBackend {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;
    fn render(&self, figure: &Figure) -> Result<Vec<u8>, RenderError>;
}

// Plot-area margins in pixels
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 48.0;

/// Maps plot coordinates onto pixel positions inside the margins.
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub bounds: Bounds,
}

impl Frame {
    pub fn new(width: u32, height: u32, bounds: Bounds) -> Self {
        let right = (width as f64 - MARGIN_RIGHT).max(MARGIN_LEFT + 1.0);
        let bottom = (height as f64 - MARGIN_BOTTOM).max(MARGIN_TOP + 1.0);
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            right,
            bottom,
            bounds,
        }
    }

    pub fn px(&self, x: f64) -> f64 {
        let b = &self.bounds;
        self.left + (x - b.x0) / (b.x1 - b.x0) * (self.right - self.left)
    }

    /// `y` is already on the plotted axis (see [`Figure::axis_y`]).
    pub fn py(&self, y: f64) -> f64 {
        let b = &self.bounds;
        self.bottom - (y - b.y0) / (b.y1 - b.y0) * (self.bottom - self.top)
    }
}

/// Nice 1-2-5 progression of tick positions covering `[lo, hi]`.
pub fn ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(hi > lo) || target == 0 {
        return Vec::new();
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Label for a tick value; on a log axis the value is the exponent.
pub fn tick_label(value: f64, log_axis: bool) -> String {
    if log_axis {
        return format!("1e{}", value.round() as i64);
    }
    let a = value.abs();
    if a == 0.0 {
        "0".to_string()
    } else if a >= 1e4 || a < 1e-3 {
        format!("{value:.1e}")
    } else if a >= 100.0 {
        format!("{value:.0}")
    } else if a >= 1.0 {
        format!("{value:.1}")
    } else {
        format!("{value:.3}")
    }
}
