use ecgview_core::density::trapezoid;
use ecgview_core::{
    analyze, extract_and_analyze, AnalysisConfig, AnalysisError, Descriptor, DescriptorKind,
    InMemoryExtractor, SegmentRequest, SegmentWindow, Signal,
};
use std::f64::consts::PI;

fn sine_record(amplitude: f64, freq: f64, sample_rate: u32, seconds: usize) -> Signal {
    let n = sample_rate as usize * seconds;
    let samples = (0..n)
        .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin())
        .collect();
    Signal::new(samples, sample_rate).unwrap()
}

#[test]
fn test_sine_wave_end_to_end() {
    let amplitude = 1.5;
    let signal = sine_record(amplitude, 1.0, 250, 20);
    assert_eq!(signal.len(), 5000);

    let analysis = analyze(&signal, &AnalysisConfig::default());
    assert!(analysis.is_complete());

    let stats = analysis.statistics.as_ref().unwrap();
    assert!(stats.mean.abs() < 1e-9, "mean {}", stats.mean);
    assert!(
        (stats.variance - amplitude * amplitude / 2.0).abs() < 1e-6,
        "variance {}",
        stats.variance
    );
    assert!((stats.std_dev - stats.variance.sqrt()).abs() < 1e-12);

    let psd = analysis.psd.as_ref().unwrap();
    let peak = psd.peak_frequency().unwrap();
    assert!(
        (peak - 1.0).abs() <= psd.freq_resolution(),
        "PSD peak at {peak} Hz, bin width {}",
        psd.freq_resolution()
    );
    assert!((psd.frequencies.last().unwrap() - 125.0).abs() < 1e-9);
    assert!(psd.power.iter().all(|&p| p >= 0.0));

    let acf = analysis.autocorrelation.as_ref().unwrap();
    let ss: f64 = signal
        .samples()
        .iter()
        .map(|x| (x - stats.mean).powi(2))
        .sum();
    assert!((acf.values[0] - ss).abs() / ss < 1e-9);
    assert!(acf.values.iter().all(|&v| v <= acf.values[0]));

    let ecdf = analysis.ecdf.as_ref().unwrap();
    assert_eq!(ecdf.y[ecdf.y.len() - 1], 1.0);
    assert!(ecdf.y.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_statistics_identity_on_arbitrary_segment() {
    let samples: Vec<f64> = (0..997).map(|i| ((i * 37) % 101) as f64 * 0.013 - 0.4).collect();
    let signal = Signal::new(samples.clone(), 360).unwrap();
    let stats = analyze(&signal, &AnalysisConfig::default()).statistics.unwrap();
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    assert!((stats.variance - var).abs() < 1e-12);
    assert!((stats.std_dev - var.sqrt()).abs() < 1e-12);
}

#[test]
fn test_density_descriptor_is_a_density() {
    // raised cosine bump: smooth and unimodal
    let samples: Vec<f64> = (1..2000)
        .map(|i| {
            let u = i as f64 / 2000.0;
            (2.0 * u - 1.0).powi(3) + 0.1 * (2.0 * u - 1.0)
        })
        .collect();
    let signal = Signal::new(samples, 250).unwrap();
    let analysis = analyze(&signal, &AnalysisConfig::default());
    let density = analysis.density.unwrap();
    assert!(density.pdf.iter().all(|&p| p >= 0.0));
    let area = trapezoid(&density.xs, &density.pdf);
    assert!(area > 0.9 && area < 1.01, "area {area}");
}

#[test]
fn test_constant_segment() {
    let signal = Signal::new(vec![1.0, 1.0, 1.0, 1.0, 1.0], 250).unwrap();
    let analysis = analyze(&signal, &AnalysisConfig::default());

    assert!(matches!(
        analysis.density,
        Err(AnalysisError::DegenerateDistribution { .. })
    ));
    assert_eq!(
        analysis.autocorrelation.as_ref().unwrap().values,
        vec![0.0, 0.0, 0.0, 0.0, 0.0]
    );
    let stats = analysis.statistics.as_ref().unwrap();
    assert_eq!(stats.mean, 1.0);
    assert_eq!(stats.variance, 0.0);

    let kinds: Vec<_> = analysis.descriptors().map(|d| d.kind()).collect();
    assert!(!kinds.contains(&DescriptorKind::Density));
}

#[test]
fn test_empty_window_fails_before_analysis() {
    let mut extractor = InMemoryExtractor::new();
    extractor.insert("chf01", vec![sine_record(1.0, 1.0, 250, 2)]);

    let request = SegmentRequest::new("chf01", 0, SegmentWindow::new(100, 100));
    let err = extract_and_analyze(&extractor, &request, &AnalysisConfig::default()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidRange {
            start: 100,
            end: 100,
            len: 500
        }
    );
}

#[test]
fn test_window_past_end_fails() {
    let mut extractor = InMemoryExtractor::new();
    extractor.insert("chf01", vec![sine_record(1.0, 1.0, 250, 2)]);

    let request = SegmentRequest::new("chf01", 0, SegmentWindow::new(400, 600));
    assert!(matches!(
        extract_and_analyze(&extractor, &request, &AnalysisConfig::default()),
        Err(AnalysisError::InvalidRange { .. })
    ));
}

#[test]
fn test_descriptors_serialize() {
    let signal = sine_record(1.0, 2.0, 100, 3);
    let analysis = analyze(&signal, &AnalysisConfig::default());
    for d in analysis.descriptors() {
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], serde_json::to_value(d.kind()).unwrap());
        if let Descriptor::Psd(psd) = &d {
            assert_eq!(json["segment_len"], psd.segment_len);
        }
    }
}
