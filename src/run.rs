//! Wires the record source, the estimators and the reporters together.

use crate::canvas::png::PngBackend;
use crate::canvas::svg::SvgBackend;
use crate::canvas::FigureBackend;
use crate::config::{Cli, ConfigError, OutputFormat};
use crate::record::{RecordDirectory, RecordError};
use crate::report::{
    FigureReporter, JsonExporter, LogReporter, ReportContext, ReportError, ReporterSet,
};
use ecgview_core::{
    extract_and_analyze, AnalysisConfig, AnalysisError, DescriptorKind, SegmentExtractor,
    SegmentRequest, SegmentWindow,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What happened to one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    pub record_id: String,
    pub descriptors: usize,
    /// Estimators that produced nothing for this segment.
    pub failed_estimators: Vec<DescriptorKind>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<RecordOutcome>,
    /// Records skipped under `--keep-going`, with the reason.
    pub failed_records: Vec<(String, String)>,
    pub write_failures: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed_records.is_empty()
    }

    pub fn log(&self) {
        let estimator_failures: usize = self.outcomes.iter().map(|o| o.failed_estimators.len()).sum();
        log::info!(
            "{} record(s) analyzed, {} failed, {} estimator failure(s), {} skipped write(s)",
            self.outcomes.len(),
            self.failed_records.len(),
            estimator_failures,
            self.write_failures
        );
        for (id, reason) in &self.failed_records {
            log::warn!("{id}: {reason}");
        }
    }
}

/// Reporters selected on the command line. Statistics are always logged;
/// file reporters only when saving.
pub fn build_reporters(cli: &Cli) -> ReporterSet {
    let mut set = ReporterSet::new(cli.write_policy);
    set.push(Box::new(LogReporter));
    if !cli.save {
        return set;
    }

    let formats = cli.output_formats();
    let backends: Vec<Box<dyn FigureBackend>> = formats
        .iter()
        .filter_map(|f| match f {
            OutputFormat::Png => Some(Box::new(PngBackend) as Box<dyn FigureBackend>),
            OutputFormat::Svg => Some(Box::new(SvgBackend) as Box<dyn FigureBackend>),
            OutputFormat::Json => None,
        })
        .collect();
    if !backends.is_empty() {
        set.push(Box::new(FigureReporter::new(&cli.out, backends)));
    }
    if formats.contains(&OutputFormat::Json) {
        set.push(Box::new(JsonExporter::new(&cli.out)));
    }
    set
}

/// Extract, analyze and report one segment.
///
/// The raw segment is reported first, then each descriptor in order, then
/// the estimators that failed. Extraction errors stop the record before any
/// reporter is called.
pub fn process_record(
    extractor: &dyn SegmentExtractor,
    request: &SegmentRequest,
    config: &AnalysisConfig,
    reporters: &mut ReporterSet,
) -> Result<RecordOutcome, RunError> {
    let (signal, analysis) = extract_and_analyze(extractor, request, config)?;
    let ctx = ReportContext {
        record_id: &request.record_id,
        channel: request.channel,
        window: request.window,
    };

    reporters.signal(&ctx, &signal)?;
    let mut descriptors = 0;
    for descriptor in analysis.descriptors() {
        reporters.descriptor(&ctx, &descriptor)?;
        descriptors += 1;
    }
    let mut failed_estimators = Vec::new();
    for (kind, error) in analysis.failures() {
        reporters.failure(&ctx, kind, error)?;
        failed_estimators.push(kind);
    }
    reporters.finish(&ctx)?;

    Ok(RecordOutcome {
        record_id: request.record_id.clone(),
        descriptors,
        failed_estimators,
    })
}

/// Run the same window over each record in turn.
///
/// The first failing record aborts the run unless `keep_going` is set, in
/// which case it is logged and recorded in the summary.
pub fn run_all(
    extractor: &dyn SegmentExtractor,
    record_ids: &[String],
    channel: usize,
    window: SegmentWindow,
    config: &AnalysisConfig,
    reporters: &mut ReporterSet,
    keep_going: bool,
) -> Result<RunSummary, RunError> {
    let mut summary = RunSummary::default();
    for id in record_ids {
        log::info!("Processing record {id}");
        let request = SegmentRequest::new(id.as_str(), channel, window);
        match process_record(extractor, &request, config, reporters) {
            Ok(outcome) => summary.outcomes.push(outcome),
            Err(e) if keep_going => {
                log::error!("{id}: {e}");
                summary.failed_records.push((id.clone(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }
    summary.write_failures = reporters.write_failures();
    Ok(summary)
}

/// Everything the binary does after argument parsing.
pub fn run(cli: &Cli) -> Result<RunSummary, RunError> {
    let config = cli.analysis_config()?;
    let records = RecordDirectory::new(&cli.path).with_sample_rate(cli.fs);
    let mut reporters = build_reporters(cli);

    let ids = if cli.run_all_records {
        let ids = records.list_records()?;
        if ids.is_empty() {
            log::warn!("no records found in {}", records.dir().display());
        }
        ids
    } else {
        vec![cli.record.clone()]
    };

    run_all(
        &records,
        &ids,
        cli.channel,
        cli.window(),
        &config,
        &mut reporters,
        cli.keep_going,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::colors::TEXT;
    use clap::Parser;
    use ecgview_core::{InMemoryExtractor, Signal};

    fn sine(n: usize) -> Signal {
        let samples = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 250.0).sin())
            .collect();
        Signal::new(samples, 250).unwrap()
    }

    fn extractor() -> InMemoryExtractor {
        let mut ex = InMemoryExtractor::new();
        ex.insert("a", vec![sine(3000)])
            .insert("flat", vec![Signal::new(vec![0.5; 3000], 250).unwrap()])
            .insert("short", vec![sine(100)]);
        ex
    }

    fn log_only() -> ReporterSet {
        let mut set = ReporterSet::new(Default::default());
        set.push(Box::new(LogReporter));
        set
    }

    #[test]
    fn test_process_record_counts_descriptors() {
        let request = SegmentRequest::new("a", 0, SegmentWindow::new(0, 2500));
        let outcome =
            process_record(&extractor(), &request, &AnalysisConfig::default(), &mut log_only())
                .unwrap();
        assert_eq!(outcome.descriptors, 5);
        assert!(outcome.failed_estimators.is_empty());
    }

    #[test]
    fn test_flat_segment_is_not_fatal() {
        let request = SegmentRequest::new("flat", 0, SegmentWindow::new(0, 2500));
        let outcome =
            process_record(&extractor(), &request, &AnalysisConfig::default(), &mut log_only())
                .unwrap();
        assert_eq!(outcome.descriptors, 3);
        assert_eq!(
            outcome.failed_estimators,
            vec![DescriptorKind::Density, DescriptorKind::Psd]
        );
    }

    #[test]
    fn test_run_all_stops_on_bad_record() {
        let ids: Vec<String> = ["a", "short", "flat"].iter().map(|s| s.to_string()).collect();
        let err = run_all(
            &extractor(),
            &ids,
            0,
            SegmentWindow::new(0, 2500),
            &AnalysisConfig::default(),
            &mut log_only(),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RunError::Analysis(AnalysisError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_run_all_keep_going() {
        let ids: Vec<String> = ["a", "short", "flat", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let summary = run_all(
            &extractor(),
            &ids,
            0,
            SegmentWindow::new(0, 2500),
            &AnalysisConfig::default(),
            &mut log_only(),
            true,
        )
        .unwrap();
        let done: Vec<_> = summary.outcomes.iter().map(|o| o.record_id.as_str()).collect();
        assert_eq!(done, vec!["a", "flat"]);
        let failed: Vec<_> = summary.failed_records.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["short", "missing"]);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_reporters_follow_flags() {
        let cli = Cli::try_parse_from(["ecgview", "--format", "png,svg,json"]).unwrap();
        assert_eq!(build_reporters(&cli).len(), 3);
        let cli = Cli::try_parse_from(["ecgview", "--format", "json"]).unwrap();
        assert_eq!(build_reporters(&cli).len(), 2);
        let cli = Cli::try_parse_from(["ecgview", "--save", "false", "--format", "svg"]).unwrap();
        assert_eq!(build_reporters(&cli).len(), 1);
    }

    fn write_record(dir: &std::path::Path) {
        let values: Vec<i16> = (0..1200)
            .map(|i| ((i as f64 * 0.2).sin() * 400.0) as i16)
            .collect();
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(dir.join("r1.dat"), bytes).unwrap();
        std::fs::write(
            dir.join("r1.hea"),
            "r1 1 250 1200\nr1.dat 16 200 12 0 0 0 0 ECG\n",
        )
        .unwrap();
    }

    #[test]
    fn test_run_writes_artifacts_for_a_record_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        write_record(dir.path());

        let cli = Cli::try_parse_from([
            "ecgview",
            "--path",
            dir.path().to_str().unwrap(),
            "--record",
            "r1",
            "--start",
            "100",
            "--end",
            "1100",
            "--out",
            out.to_str().unwrap(),
            "--format",
            "svg,json",
        ])
        .unwrap();
        let summary = run(&cli).unwrap();
        assert!(summary.is_clean());
        assert_eq!(summary.outcomes[0].descriptors, 5);
        assert!(out.join("ecg_signal/r1.svg").is_file());
        assert!(out.join("psd/r1.svg").is_file());
        assert!(out.join("json/r1.json").is_file());
        assert!(!out.join("psd/r1.png").exists());
    }

    #[test]
    fn test_default_png_artifacts_carry_a_title() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plots");
        write_record(dir.path());

        let cli = Cli::try_parse_from([
            "ecgview",
            "--path",
            dir.path().to_str().unwrap(),
            "--record",
            "r1",
            "--start",
            "100",
            "--end",
            "1100",
            "--out",
            out.to_str().unwrap(),
        ])
        .unwrap();
        run(&cli).unwrap();

        for kind in ["ecg_signal", "ecdf", "pdf", "autocorrelation", "psd"] {
            let img = image::open(out.join(kind).join("r1.png")).unwrap().to_rgb8();
            let title_pixels = (0..30)
                .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
                .filter(|&(x, y)| img.get_pixel(x, y).0 == TEXT)
                .count();
            assert!(title_pixels > 50, "{kind} plot has no title");
        }
    }
}
