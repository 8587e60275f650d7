use super::colors::{BAR_ALPHA, KDE_RED, SERIES_BLUE, SIGNAL_BLUE};
use ecgview_core::{Descriptor, Signal};

#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    Line {
        label: String,
        color: [u8; 3],
        xs: Vec<f64>,
        ys: Vec<f64>,
    },
    Points {
        label: String,
        color: [u8; 3],
        xs: Vec<f64>,
        ys: Vec<f64>,
    },
    /// Bars between consecutive `edges`, drawn translucent.
    Bars {
        label: String,
        color: [u8; 3],
        alpha: f32,
        edges: Vec<f64>,
        heights: Vec<f64>,
    },
}

impl Series {
    pub fn label(&self) -> &str {
        match self {
            Series::Line { label, .. } | Series::Points { label, .. } | Series::Bars { label, .. } => {
                label
            }
        }
    }

    /// Every (x, y) corner the series can touch.
    fn extent_points(&self) -> Box<dyn Iterator<Item = (f64, f64)> + '_> {
        match self {
            Series::Line { xs, ys, .. } | Series::Points { xs, ys, .. } => {
                Box::new(xs.iter().copied().zip(ys.iter().copied()))
            }
            Series::Bars { edges, heights, .. } => Box::new(
                edges
                    .windows(2)
                    .zip(heights.iter())
                    .flat_map(|(e, &h)| [(e[0], 0.0), (e[1], h)]),
            ),
        }
    }
}

/// Backend-neutral plot description.
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Logarithmic y axis; non-positive values are left out.
    pub log_y: bool,
    pub width: u32,
    pub height: u32,
    pub series: Vec<Series>,
}

/// Data range in plot coordinates (log10 already applied when `log_y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            log_y: false,
            width: 1000,
            height: 400,
            series: Vec::new(),
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn log_y(mut self) -> Self {
        self.log_y = true;
        self
    }

    pub fn with(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Map a data y value onto the plotted axis. `None` when it cannot be shown.
    pub fn axis_y(&self, y: f64) -> Option<f64> {
        if !y.is_finite() {
            return None;
        }
        if self.log_y {
            (y > 0.0).then(|| y.log10())
        } else {
            Some(y)
        }
    }

    /// Range covering every drawable point, padded so flat data still has extent.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut b = Bounds {
            x0: f64::INFINITY,
            x1: f64::NEG_INFINITY,
            y0: f64::INFINITY,
            y1: f64::NEG_INFINITY,
        };
        for (x, y) in self.series.iter().flat_map(|s| s.extent_points()) {
            let Some(y) = self.axis_y(y) else { continue };
            if !x.is_finite() {
                continue;
            }
            b.x0 = b.x0.min(x);
            b.x1 = b.x1.max(x);
            b.y0 = b.y0.min(y);
            b.y1 = b.y1.max(y);
        }
        if !b.x0.is_finite() {
            return None;
        }
        if b.x1 - b.x0 <= 0.0 {
            b.x0 -= 0.5;
            b.x1 += 0.5;
        }
        let pad = if b.y1 - b.y0 > 0.0 { (b.y1 - b.y0) * 0.05 } else { 0.5 };
        b.y0 -= pad;
        b.y1 += pad;
        Some(b)
    }
}

/// Time-domain plot of the extracted segment.
pub fn signal_figure(signal: &Signal, record_id: &str) -> Figure {
    let fs = signal.sample_rate() as f64;
    let xs = (0..signal.len()).map(|i| i as f64 / fs).collect();
    Figure::new(
        format!("ECG signal (record {record_id})"),
        "Time (seconds)",
        "Amplitude (mV)",
    )
    .size(1200, 400)
    .with(Series::Line {
        label: "ECG".into(),
        color: SIGNAL_BLUE,
        xs,
        ys: signal.samples().to_vec(),
    })
}

/// Plot for a descriptor; statistics have none.
pub fn descriptor_figure(descriptor: &Descriptor) -> Option<Figure> {
    match descriptor {
        Descriptor::Statistics(_) => None,
        Descriptor::Ecdf(e) => Some(
            Figure::new("Empirical distribution function (ECDF)", "Amplitude (mV)", "F(x)")
                .size(800, 400)
                .with(Series::Points {
                    label: "ECDF".into(),
                    color: SERIES_BLUE,
                    xs: e.x.clone(),
                    ys: e.y.clone(),
                }),
        ),
        Descriptor::Density(d) => Some(
            Figure::new(
                "Probability density (PDF)",
                "Amplitude (mV)",
                "Probability density",
            )
            .size(800, 400)
            .with(Series::Bars {
                label: "Histogram (PDF)".into(),
                color: SERIES_BLUE,
                alpha: BAR_ALPHA,
                edges: d.histogram.edges.clone(),
                heights: d.histogram.density.clone(),
            })
            .with(Series::Line {
                label: "KDE (PDF)".into(),
                color: KDE_RED,
                xs: d.xs.clone(),
                ys: d.pdf.clone(),
            }),
        ),
        Descriptor::Autocorrelation(a) => Some(
            Figure::new(
                "Autocorrelation of the ECG signal",
                "Lag (samples)",
                "Autocorrelation",
            )
            .with(Series::Line {
                label: "ACF".into(),
                color: SERIES_BLUE,
                xs: a.lags.iter().map(|&l| l as f64).collect(),
                ys: a.values.clone(),
            }),
        ),
        Descriptor::Psd(p) => Some(
            Figure::new(
                "Power spectral density (PSD) of the ECG signal",
                "Frequency (Hz)",
                "Power density (V^2/Hz)",
            )
            .log_y()
            .with(Series::Line {
                label: "PSD".into(),
                color: SERIES_BLUE,
                xs: p.frequencies.clone(),
                ys: p.power.clone(),
            }),
        ),
    }
}
