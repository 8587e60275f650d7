use super::colors::{blend, AXIS, BACKGROUND, GRID, TEXT};
use super::{tick_label, ticks, Figure, FigureBackend, Frame, RenderError, Series};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

/// Glyph cell size of the bitmap font, in pixels at scale 1.
const GLYPH: i64 = 8;

/// Raster backend with an 8x8 bitmap font for title, labels, ticks and legend.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngBackend;

impl FigureBackend for PngBackend {
    fn extension(&self) -> &'static str {
        "png"
    }

    fn render(&self, figure: &Figure) -> Result<Vec<u8>, RenderError> {
        let img = rasterize(figure);
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer).write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(buffer)
    }
}

pub fn rasterize(figure: &Figure) -> RgbImage {
    let width = figure.width.max(1);
    let height = figure.height.max(1);
    let mut canvas = Canvas {
        img: RgbImage::from_pixel(width, height, Rgb(BACKGROUND)),
    };

    let (w, h) = (width as i64, height as i64);
    canvas.text(w / 2, 8, &figure.title, 2, Anchor::Middle);
    canvas.text(w / 2, h - 16, &figure.x_label, 1, Anchor::Middle);
    canvas.vertical_text(4, h / 2, &figure.y_label);

    // Nothing drawable (e.g. an all-zero spectrum on a log axis): labels only
    let Some(bounds) = figure.bounds() else {
        return canvas.img;
    };
    let frame = Frame::new(width, height, bounds);

    for x in ticks(bounds.x0, bounds.x1, 8) {
        let px = frame.px(x);
        canvas.line(px, frame.top, px, frame.bottom, GRID, &frame);
        canvas.text(
            px.round() as i64,
            frame.bottom as i64 + 4,
            &tick_label(x, false),
            1,
            Anchor::Middle,
        );
    }
    for y in ticks(bounds.y0, bounds.y1, 5) {
        let py = frame.py(y);
        canvas.line(frame.left, py, frame.right, py, GRID, &frame);
        canvas.text(
            frame.left as i64 - 4,
            py.round() as i64 - GLYPH / 2,
            &tick_label(y, figure.log_y),
            1,
            Anchor::End,
        );
    }

    for series in &figure.series {
        match series {
            Series::Bars {
                color,
                alpha,
                edges,
                heights,
                ..
            } => {
                let base = figure.axis_y(0.0).unwrap_or(bounds.y0);
                for (e, &h) in edges.windows(2).zip(heights) {
                    let Some(top) = figure.axis_y(h) else { continue };
                    canvas.fill_rect(
                        frame.px(e[0]),
                        frame.py(top),
                        frame.px(e[1]),
                        frame.py(base),
                        *color,
                        *alpha,
                        &frame,
                    );
                }
            }
            Series::Line { color, xs, ys, .. } => {
                let mut prev: Option<(f64, f64)> = None;
                for (&x, &y) in xs.iter().zip(ys) {
                    let point = figure.axis_y(y).map(|y| (frame.px(x), frame.py(y)));
                    if let (Some((x0, y0)), Some((x1, y1))) = (prev, point) {
                        canvas.line(x0, y0, x1, y1, *color, &frame);
                    }
                    prev = point;
                }
            }
            Series::Points { color, xs, ys, .. } => {
                for (&x, &y) in xs.iter().zip(ys) {
                    if let Some(y) = figure.axis_y(y) {
                        canvas.dot(frame.px(x), frame.py(y), *color, &frame);
                    }
                }
            }
        }
    }

    if figure.series.len() >= 2 {
        canvas.legend(figure, &frame);
    }
    canvas.rect_outline(&frame, AXIS);
    canvas.img
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Start,
    Middle,
    End,
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    /// Unclipped pixel write for text outside the plot area.
    fn put_any(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    /// Horizontal text with its top edge at `y`.
    fn text(&mut self, x: i64, y: i64, text: &str, scale: i64, anchor: Anchor) {
        let advance = GLYPH * scale;
        let width = text.chars().count() as i64 * advance;
        let mut cx = match anchor {
            Anchor::Start => x,
            Anchor::Middle => x - width / 2,
            Anchor::End => x - width,
        };
        for c in text.chars() {
            if let Some(rows) = BASIC_FONTS.get(c) {
                for (gy, &row) in rows.iter().enumerate() {
                    for gx in 0..8u32 {
                        // bit 0 is the leftmost pixel
                        if row & (1u8 << gx) == 0 {
                            continue;
                        }
                        let px = cx + gx as i64 * scale;
                        let py = y + gy as i64 * scale;
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.put_any(px + sx, py + sy, TEXT);
                            }
                        }
                    }
                }
            }
            cx += advance;
        }
    }

    /// Text rotated a quarter turn counter-clockwise, centred on `y`, left
    /// edge at `x`.
    fn vertical_text(&mut self, x: i64, y: i64, text: &str) {
        let height = text.chars().count() as i64 * GLYPH;
        let mut cy = y + height / 2;
        for c in text.chars() {
            if let Some(rows) = BASIC_FONTS.get(c) {
                for (gy, &row) in rows.iter().enumerate() {
                    for gx in 0..8u32 {
                        if row & (1u8 << gx) != 0 {
                            self.put_any(x + gy as i64, cy - gx as i64, TEXT);
                        }
                    }
                }
            }
            cy -= GLYPH;
        }
    }

    fn legend(&mut self, figure: &Figure, frame: &Frame) {
        let x = frame.right as i64 - 140;
        for (i, series) in figure.series.iter().enumerate() {
            let color = match series {
                Series::Line { color, .. } | Series::Points { color, .. } | Series::Bars { color, .. } => {
                    *color
                }
            };
            let y = frame.top as i64 + 8 + i as i64 * 14;
            for sy in 0..GLYPH {
                for sx in 0..12 {
                    self.put_any(x + sx, y + sy, color);
                }
            }
            self.text(x + 16, y, series.label(), 1, Anchor::Start);
        }
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 3], frame: &Frame) {
        if (x as f64) < frame.left.floor()
            || (x as f64) > frame.right.ceil()
            || (y as f64) < frame.top.floor()
            || (y as f64) > frame.bottom.ceil()
        {
            return;
        }
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }

    /// Bresenham, clipped to the plot area.
    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: [u8; 3], frame: &Frame) {
        let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
        let (xe, ye) = (x1.round() as i64, y1.round() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color, frame);
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn dot(&mut self, x: f64, y: f64, color: [u8; 3], frame: &Frame) {
        let (cx, cy) = (x.round() as i64, y.round() as i64);
        for oy in -1..=1 {
            for ox in -1..=1 {
                self.put(cx + ox, cy + oy, color, frame);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_rect(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: [u8; 3],
        alpha: f32,
        frame: &Frame,
    ) {
        let (xa, xb) = (x0.min(x1).round() as i64, x0.max(x1).round() as i64);
        let (ya, yb) = (y0.min(y1).round() as i64, y0.max(y1).round() as i64);
        for y in ya..=yb {
            for x in xa..=xb {
                if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
                    continue;
                }
                let base = self.img.get_pixel(x as u32, y as u32).0;
                self.put(x, y, blend(base, color, alpha), frame);
            }
        }
    }

    fn rect_outline(&mut self, frame: &Frame, color: [u8; 3]) {
        let (l, t, r, b) = (frame.left, frame.top, frame.right, frame.bottom);
        self.line(l, t, r, t, color, frame);
        self.line(r, t, r, b, color, frame);
        self.line(r, b, l, b, color, frame);
        self.line(l, b, l, t, color, frame);
    }
}
