use super::colors::{hex, AXIS, BACKGROUND, GRID, TEXT};
use super::{tick_label, ticks, Figure, FigureBackend, Frame, RenderError, Series};
use std::fmt::Write;

/// Vector backend with title, axis labels, tick labels and a legend.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvgBackend;

impl FigureBackend for SvgBackend {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, figure: &Figure) -> Result<Vec<u8>, RenderError> {
        Ok(to_svg(figure).into_bytes())
    }
}

pub fn to_svg(figure: &Figure) -> String {
    let (w, h) = (figure.width, figure.height);
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="{}"/>"#, hex(BACKGROUND));
    let _ = writeln!(
        out,
        r#"<text x="{}" y="22" text-anchor="middle" font-size="15" fill="{}">{}</text>"#,
        w / 2,
        hex(TEXT),
        escape(&figure.title)
    );

    if let Some(bounds) = figure.bounds() {
        let frame = Frame::new(w, h, bounds);
        write_axes(&mut out, figure, &frame);
        for series in &figure.series {
            write_series(&mut out, figure, &frame, series);
        }
        write_legend(&mut out, figure, &frame);
        let _ = writeln!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{}"/>"#,
            frame.left,
            frame.top,
            frame.right - frame.left,
            frame.bottom - frame.top,
            hex(AXIS)
        );
    }

    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="12" fill="{}">{}</text>"#,
        w / 2,
        h.saturating_sub(8),
        hex(TEXT),
        escape(&figure.x_label)
    );
    let _ = writeln!(
        out,
        r#"<text x="16" y="{}" text-anchor="middle" font-size="12" fill="{}" transform="rotate(-90 16 {})">{}</text>"#,
        h / 2,
        hex(TEXT),
        h / 2,
        escape(&figure.y_label)
    );
    out.push_str("</svg>\n");
    out
}

fn write_axes(out: &mut String, figure: &Figure, frame: &Frame) {
    let b = frame.bounds;
    for x in ticks(b.x0, b.x1, 8) {
        let px = frame.px(x);
        let _ = writeln!(
            out,
            r#"<line x1="{px:.1}" y1="{:.1}" x2="{px:.1}" y2="{:.1}" stroke="{}"/><text x="{px:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="{}">{}</text>"#,
            frame.top,
            frame.bottom,
            hex(GRID),
            frame.bottom + 14.0,
            hex(TEXT),
            tick_label(x, false)
        );
    }
    for y in ticks(b.y0, b.y1, 5) {
        let py = frame.py(y);
        let _ = writeln!(
            out,
            r#"<line x1="{:.1}" y1="{py:.1}" x2="{:.1}" y2="{py:.1}" stroke="{}"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10" fill="{}">{}</text>"#,
            frame.left,
            frame.right,
            hex(GRID),
            frame.left - 4.0,
            py + 3.0,
            hex(TEXT),
            tick_label(y, figure.log_y)
        );
    }
}

fn write_series(out: &mut String, figure: &Figure, frame: &Frame, series: &Series) {
    match series {
        Series::Line { color, xs, ys, .. } => {
            // Unplottable values split the curve into separate polylines
            let mut run: Vec<(f64, f64)> = Vec::new();
            let flush = |run: &mut Vec<(f64, f64)>, out: &mut String| {
                if run.len() >= 2 {
                    let points: Vec<String> =
                        run.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).collect();
                    let _ = writeln!(
                        out,
                        r#"<polyline fill="none" stroke="{}" stroke-width="1" points="{}"/>"#,
                        hex(*color),
                        points.join(" ")
                    );
                }
                run.clear();
            };
            for (&x, &y) in xs.iter().zip(ys) {
                match figure.axis_y(y) {
                    Some(y) => run.push((frame.px(x), frame.py(y))),
                    None => flush(&mut run, out),
                }
            }
            flush(&mut run, out);
        }
        Series::Points { color, xs, ys, .. } => {
            let _ = writeln!(out, r#"<g fill="{}">"#, hex(*color));
            for (&x, &y) in xs.iter().zip(ys) {
                if let Some(y) = figure.axis_y(y) {
                    let _ = writeln!(
                        out,
                        r#"<circle cx="{:.2}" cy="{:.2}" r="1.5"/>"#,
                        frame.px(x),
                        frame.py(y)
                    );
                }
            }
            out.push_str("</g>\n");
        }
        Series::Bars {
            color,
            alpha,
            edges,
            heights,
            ..
        } => {
            let base = frame.py(figure.axis_y(0.0).unwrap_or(frame.bounds.y0));
            let _ = writeln!(out, r#"<g fill="{}" fill-opacity="{alpha}">"#, hex(*color));
            for (e, &h) in edges.windows(2).zip(heights) {
                let Some(top) = figure.axis_y(h).map(|v| frame.py(v)) else {
                    continue;
                };
                let (x0, x1) = (frame.px(e[0]), frame.px(e[1]));
                let _ = writeln!(
                    out,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/>"#,
                    x0.min(x1),
                    top.min(base),
                    (x1 - x0).abs(),
                    (base - top).abs()
                );
            }
            out.push_str("</g>\n");
        }
    }
}

fn write_legend(out: &mut String, figure: &Figure, frame: &Frame) {
    if figure.series.len() < 2 {
        return;
    }
    for (i, series) in figure.series.iter().enumerate() {
        let color = match series {
            Series::Line { color, .. } | Series::Points { color, .. } | Series::Bars { color, .. } => {
                *color
            }
        };
        let y = frame.top + 14.0 + i as f64 * 16.0;
        let x = frame.right - 140.0;
        let _ = writeln!(
            out,
            r#"<rect x="{x:.1}" y="{:.1}" width="12" height="8" fill="{}"/><text x="{:.1}" y="{y:.1}" font-size="11" fill="{}">{}</text>"#,
            y - 8.0,
            hex(color),
            x + 16.0,
            hex(TEXT),
            escape(series.label())
        );
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::colors::SERIES_BLUE;

    #[test]
    fn test_contains_title_and_labels() {
        let fig = Figure::new("PSD <ch 0>", "Frequency (Hz)", "Power").with(Series::Line {
            label: "PSD".into(),
            color: SERIES_BLUE,
            xs: vec![0.0, 1.0, 2.0],
            ys: vec![1.0, 2.0, 3.0],
        });
        let svg = to_svg(&fig);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("PSD &lt;ch 0&gt;"));
        assert!(svg.contains("Frequency (Hz)"));
        assert_eq!(svg.matches("<polyline").count(), 1);
    }

    #[test]
    fn test_zero_power_splits_log_curve() {
        let fig = Figure::new("psd", "f", "p").log_y().with(Series::Line {
            label: "PSD".into(),
            color: SERIES_BLUE,
            xs: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            ys: vec![1.0, 2.0, 0.0, 3.0, 4.0, 0.0],
        });
        let svg = to_svg(&fig);
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(!svg.contains("NaN") && !svg.contains("inf"));
    }

    #[test]
    fn test_legend_only_with_several_series() {
        let one = Figure::new("a", "x", "y").with(Series::Points {
            label: "ECDF".into(),
            color: SERIES_BLUE,
            xs: vec![0.0, 1.0],
            ys: vec![0.5, 1.0],
        });
        assert!(!to_svg(&one).contains(">ECDF<"));
        let two = one.clone().with(Series::Line {
            label: "other".into(),
            color: SERIES_BLUE,
            xs: vec![0.0, 1.0],
            ys: vec![0.0, 1.0],
        });
        let svg = to_svg(&two);
        assert!(svg.contains(">ECDF<") && svg.contains(">other<"));
    }
}
