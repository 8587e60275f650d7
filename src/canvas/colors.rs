/// Colors shared by the raster and vector backends.
pub const BACKGROUND: [u8; 3] = [255, 255, 255];
pub const AXIS: [u8; 3] = [64, 64, 64];
pub const GRID: [u8; 3] = [225, 225, 225];
pub const TEXT: [u8; 3] = [32, 32, 32];

pub const SIGNAL_BLUE: [u8; 3] = [0, 0, 255];
pub const SERIES_BLUE: [u8; 3] = [31, 119, 180];
pub const KDE_RED: [u8; 3] = [214, 39, 40];

/// Opacity used for histogram bars drawn under a density curve.
pub const BAR_ALPHA: f32 = 0.5;

/// Composite `over` onto `base` with straight alpha.
pub fn blend(base: [u8; 3], over: [u8; 3], alpha: f32) -> [u8; 3] {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, o: u8| (b as f32 * (1.0 - a) + o as f32 * a).round() as u8;
    [mix(base[0], over[0]), mix(base[1], over[1]), mix(base[2], over[2])]
}

/// `#rrggbb` for SVG attributes.
pub fn hex(c: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}
