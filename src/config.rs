use crate::report::WritePolicy;
use clap::{ArgAction, Parser, ValueEnum};
use ecgview_core::{AnalysisConfig, SegmentWindow};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid analysis config {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: yaml_serde::Error,
    },
}

/// Artifact formats written per plot kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    Png,
    Svg,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "ecgview")]
#[command(author, version, about = "Statistical and spectral descriptors of ECG segments", long_about = None)]
pub struct Cli {
    /// Directory holding the recordings (WFDB .hea/.dat or .wav)
    #[arg(long, env = "ECGVIEW_PATH", default_value = "physionet.org/files/chfdb/1.0.0/")]
    pub path: PathBuf,

    /// Record to analyze
    #[arg(long, env = "ECGVIEW_RECORD", default_value = "chf01")]
    pub record: String,

    /// Signal index within the record
    #[arg(long, env = "ECGVIEW_CHANNEL", default_value_t = 0)]
    pub channel: usize,

    /// First sample of the segment (inclusive)
    #[arg(long, env = "ECGVIEW_START", default_value_t = 10_000)]
    pub start: usize,

    /// End of the segment (exclusive)
    #[arg(long, env = "ECGVIEW_END", default_value_t = 15_000)]
    pub end: usize,

    /// Sampling rate in Hz, overriding the one stored in the recording
    #[arg(long, env = "ECGVIEW_FS")]
    pub fs: Option<u32>,

    /// Output directory for plots and exports
    #[arg(long, env = "ECGVIEW_OUT", default_value = "plots")]
    pub out: PathBuf,

    /// Write artifacts; with false only the statistics are logged
    #[arg(long, env = "ECGVIEW_SAVE", default_value_t = true, action = ArgAction::Set)]
    pub save: bool,

    /// Artifact format (repeat or comma-separate for several)
    #[arg(
        long = "format",
        env = "ECGVIEW_FORMAT",
        value_enum,
        value_delimiter = ',',
        default_values_t = [OutputFormat::Png]
    )]
    pub formats: Vec<OutputFormat>,

    /// What to do when an artifact cannot be written
    #[arg(long, env = "ECGVIEW_WRITE_POLICY", value_enum, default_value_t = WritePolicy::FailFast)]
    pub write_policy: WritePolicy,

    /// Analyze the same window of every record in --path
    #[arg(long, env = "ECGVIEW_RUN_ALL_RECORDS")]
    pub run_all_records: bool,

    /// With --run-all-records, continue past records that fail
    #[arg(long, env = "ECGVIEW_KEEP_GOING")]
    pub keep_going: bool,

    /// YAML file with estimator parameters
    #[arg(long, env = "ECGVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn window(&self) -> SegmentWindow {
        SegmentWindow::new(self.start, self.end)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Formats to write, without repeats, in the order given.
    pub fn output_formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::new();
        for f in &self.formats {
            if !formats.contains(f) {
                formats.push(*f);
            }
        }
        formats
    }

    /// Estimator parameters from `--config`, or the defaults.
    pub fn analysis_config(&self) -> Result<AnalysisConfig, ConfigError> {
        match &self.config {
            Some(path) => load_analysis_config(path),
            None => Ok(AnalysisConfig::default()),
        }
    }
}

pub fn load_analysis_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_analysis_config(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_analysis_config(text: &str) -> Result<AnalysisConfig, yaml_serde::Error> {
    if text.trim().is_empty() {
        return Ok(AnalysisConfig::default());
    }
    yaml_serde::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ecgview_core::density::BandwidthRule;
    use ecgview_core::dsp::fft::Window;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ecgview").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.path, PathBuf::from("physionet.org/files/chfdb/1.0.0/"));
        assert_eq!(cli.record, "chf01");
        assert_eq!(cli.channel, 0);
        assert_eq!(cli.window(), SegmentWindow::new(10_000, 15_000));
        assert_eq!(cli.fs, None);
        assert_eq!(cli.out, PathBuf::from("plots"));
        assert!(cli.save);
        assert_eq!(cli.output_formats(), vec![OutputFormat::Png]);
        assert_eq!(cli.write_policy, WritePolicy::FailFast);
        assert!(!cli.run_all_records);
        assert_eq!(cli.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--record", "chf07", "--fs", "128", "--save", "false", "--format", "svg,json",
            "--format", "svg", "--write-policy", "best-effort", "-vv",
        ]);
        assert_eq!(cli.record, "chf07");
        assert_eq!(cli.fs, Some(128));
        assert!(!cli.save);
        assert_eq!(cli.output_formats(), vec![OutputFormat::Svg, OutputFormat::Json]);
        assert_eq!(cli.write_policy, WritePolicy::BestEffort);
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse_analysis_config(
            "density:\n  bandwidth: silverman\nwelch:\n  segment_len: 512\n  window: hamming\n",
        )
        .unwrap();
        assert_eq!(config.density.bandwidth, BandwidthRule::Silverman);
        assert_eq!(config.density.grid_points, 1000);
        assert_eq!(config.welch.segment_len, 512);
        assert_eq!(config.welch.window, Window::Hamming);
        assert_eq!(config.welch.overlap, None);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(parse_analysis_config("\n").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_bad_yaml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        std::fs::write(&path, "welch:\n  segment_len: lots\n").unwrap();
        let err = load_analysis_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("analysis.yaml"));
    }
}
