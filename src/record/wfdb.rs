//! Reader for PhysioNet WFDB records: a text `.hea` header describing the
//! signals plus one or more binary signal files.
//!
//! Supported storage formats are 16, 61, 80 and 212, one sample per frame.

use super::RecordError;
use std::path::{Path, PathBuf};

/// Gain assumed when the header omits it or gives 0 (ADC units per mV).
const DEFAULT_GAIN: f64 = 200.0;
const DEFAULT_SAMPLE_RATE: f64 = 250.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageFormat {
    /// 16-bit two's complement, little-endian.
    Fmt16,
    /// 16-bit two's complement, big-endian.
    Fmt61,
    /// 8-bit offset binary.
    Fmt80,
    /// Pairs of 12-bit samples packed into 3 bytes.
    Fmt212,
}

impl StorageFormat {
    fn from_code(code: u16) -> Result<Self, RecordError> {
        match code {
            16 => Ok(StorageFormat::Fmt16),
            61 => Ok(StorageFormat::Fmt61),
            80 => Ok(StorageFormat::Fmt80),
            212 => Ok(StorageFormat::Fmt212),
            other => Err(RecordError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Digital value WFDB uses to mark a missing sample.
    fn invalid_marker(self) -> i32 {
        match self {
            StorageFormat::Fmt16 | StorageFormat::Fmt61 => -32768,
            StorageFormat::Fmt80 => -128,
            StorageFormat::Fmt212 => -2048,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignalSpec {
    pub file_name: String,
    pub format: StorageFormat,
    /// Bytes to skip at the start of the signal file.
    pub byte_offset: usize,
    pub gain: f64,
    pub baseline: i32,
    pub units: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub record_name: String,
    pub sample_rate: f64,
    /// Samples per signal, when the header states it.
    pub num_samples: Option<usize>,
    pub signals: Vec<SignalSpec>,
}

impl Header {
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (line_no, record_line) = lines.next().ok_or_else(|| RecordError::Header {
            line: 0,
            reason: "header is empty".into(),
        })?;
        let fields: Vec<&str> = record_line.split_whitespace().collect();
        let header_err = |line: usize, reason: String| RecordError::Header { line, reason };

        if fields.len() < 2 {
            return Err(header_err(line_no, "record line needs a name and a signal count".into()));
        }
        let record_name = fields[0].split('/').next().unwrap_or(fields[0]).to_string();
        if fields[0].contains('/') {
            return Err(RecordError::UnsupportedFormat(format!(
                "multi-segment record {}",
                fields[0]
            )));
        }
        let nsig: usize = fields[1]
            .parse()
            .map_err(|_| header_err(line_no, format!("bad signal count {:?}", fields[1])))?;

        // fs[/counter_freq[(base_counter)]]
        let sample_rate = match fields.get(2) {
            Some(spec) => {
                let fs = spec.split('/').next().unwrap_or(spec);
                fs.parse::<f64>()
                    .map_err(|_| header_err(line_no, format!("bad sampling frequency {spec:?}")))?
            }
            None => DEFAULT_SAMPLE_RATE,
        };
        let num_samples = match fields.get(3) {
            Some(n) => Some(
                n.parse::<usize>()
                    .map_err(|_| header_err(line_no, format!("bad sample count {n:?}")))?,
            ),
            None => None,
        };

        let mut signals = Vec::with_capacity(nsig);
        for _ in 0..nsig {
            let (line_no, line) = lines.next().ok_or_else(|| {
                header_err(line_no, format!("expected {nsig} signal lines, found {}", signals.len()))
            })?;
            signals.push(parse_signal_line(line_no, line)?);
        }

        Ok(Header {
            record_name,
            sample_rate,
            num_samples,
            signals,
        })
    }
}

/// `file format[xspf][:skew][+offset] gain[(baseline)][/units] adcres adczero init checksum blocksize desc…`
fn parse_signal_line(line_no: usize, line: &str) -> Result<SignalSpec, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let err = |reason: String| RecordError::Header {
        line: line_no,
        reason,
    };
    if fields.len() < 2 {
        return Err(err("signal line needs a file name and a format".into()));
    }

    let fmt_spec = fields[1];
    let code_end = fmt_spec
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(fmt_spec.len());
    let code: u16 = fmt_spec[..code_end]
        .parse()
        .map_err(|_| err(format!("bad format {fmt_spec:?}")))?;
    let format = StorageFormat::from_code(code)?;
    if let Some(x) = fmt_spec.find('x') {
        let spf = &fmt_spec[x + 1..];
        let spf = spf.split([':', '+']).next().unwrap_or(spf);
        if spf != "1" {
            return Err(RecordError::UnsupportedFormat(format!(
                "{spf} samples per frame in {fmt_spec}"
            )));
        }
    }
    let byte_offset = match fmt_spec.split_once('+') {
        Some((_, off)) => off
            .parse()
            .map_err(|_| err(format!("bad byte offset in {fmt_spec:?}")))?,
        None => 0,
    };

    let adc_zero: i32 = match fields.get(4) {
        Some(z) => z.parse().map_err(|_| err(format!("bad ADC zero {z:?}")))?,
        None => 0,
    };

    let (gain, baseline, units) = match fields.get(2) {
        Some(spec) => parse_gain(spec, adc_zero).ok_or_else(|| err(format!("bad gain {spec:?}")))?,
        None => (DEFAULT_GAIN, adc_zero, "mV".to_string()),
    };

    Ok(SignalSpec {
        file_name: fields[0].to_string(),
        format,
        byte_offset,
        gain,
        baseline,
        units,
        description: fields.get(8..).map(|d| d.join(" ")).unwrap_or_default(),
    })
}

/// `gain[(baseline)][/units]`
fn parse_gain(spec: &str, adc_zero: i32) -> Option<(f64, i32, String)> {
    let (value, units) = match spec.split_once('/') {
        Some((v, u)) => (v, u.to_string()),
        None => (spec, "mV".to_string()),
    };
    let (gain_str, baseline) = match value.split_once('(') {
        Some((g, rest)) => (g, rest.trim_end_matches(')').parse().ok()?),
        None => (value, adc_zero),
    };
    let gain: f64 = gain_str.parse().ok()?;
    let gain = if gain == 0.0 { DEFAULT_GAIN } else { gain };
    Some((gain, baseline, units))
}

/// Decode a byte stream of one storage format into digital values.
pub fn decode(format: StorageFormat, bytes: &[u8]) -> Vec<i32> {
    match format {
        StorageFormat::Fmt16 => bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as i32)
            .collect(),
        StorageFormat::Fmt61 => bytes
            .chunks_exact(2)
            .map(|b| i16::from_be_bytes([b[0], b[1]]) as i32)
            .collect(),
        StorageFormat::Fmt80 => bytes.iter().map(|&b| b as i32 - 128).collect(),
        StorageFormat::Fmt212 => {
            let mut out = Vec::with_capacity(bytes.len() * 2 / 3 + 1);
            let mut chunks = bytes.chunks_exact(3);
            for b in &mut chunks {
                out.push(sign_extend_12(b[0] as i32 | ((b[1] as i32 & 0x0f) << 8)));
                out.push(sign_extend_12(b[2] as i32 | ((b[1] as i32 & 0xf0) << 4)));
            }
            // odd sample count: the last pair only carries its first sample
            if let [b0, b1] = chunks.remainder() {
                out.push(sign_extend_12(*b0 as i32 | ((*b1 as i32 & 0x0f) << 8)));
            }
            out
        }
    }
}

fn sign_extend_12(v: i32) -> i32 {
    if v > 2047 {
        v - 4096
    } else {
        v
    }
}

/// A parsed header plus the directory its signal files live in.
#[derive(Clone, Debug)]
pub struct WfdbRecord {
    dir: PathBuf,
    pub header: Header,
}

impl WfdbRecord {
    pub fn open(dir: &Path, record_id: &str) -> Result<Self, RecordError> {
        let path = dir.join(format!("{record_id}.hea"));
        let text = std::fs::read_to_string(&path).map_err(|source| RecordError::Io {
            path: path.clone(),
            source,
        })?;
        let header = Header::parse(&text)?;
        log::debug!(
            "{}: {} signal(s) at {} Hz",
            header.record_name,
            header.signals.len(),
            header.sample_rate
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            header,
        })
    }

    /// Physical samples (digital value minus baseline, over gain) of one
    /// channel. Missing-sample markers become NaN.
    pub fn read_channel(&self, channel: usize) -> Result<Vec<f64>, RecordError> {
        let spec = self
            .header
            .signals
            .get(channel)
            .ok_or(RecordError::NoSuchChannel {
                channel,
                available: self.header.signals.len(),
            })?;

        // Signals sharing a file are stored frame-interleaved, in header order.
        let group: Vec<&SignalSpec> = self
            .header
            .signals
            .iter()
            .filter(|s| s.file_name == spec.file_name)
            .collect();
        if group.iter().any(|s| s.format != spec.format) {
            return Err(RecordError::UnsupportedFormat(format!(
                "mixed storage formats in {}",
                spec.file_name
            )));
        }
        let column = self.header.signals[..channel]
            .iter()
            .filter(|s| s.file_name == spec.file_name)
            .count();

        let path = self.dir.join(&spec.file_name);
        let bytes = std::fs::read(&path).map_err(|source| RecordError::Io {
            path: path.clone(),
            source,
        })?;
        let bytes = bytes.get(spec.byte_offset..).unwrap_or(&[]);
        let digital = decode(spec.format, bytes);

        let frames = digital.len() / group.len();
        let frames = match self.header.num_samples {
            Some(n) if n < frames => n,
            _ => frames,
        };
        let invalid = spec.format.invalid_marker();
        let baseline = spec.baseline as f64;

        Ok(digital
            .iter()
            .skip(column)
            .step_by(group.len())
            .take(frames)
            .map(|&d| {
                if d == invalid {
                    f64::NAN
                } else {
                    (d as f64 - baseline) / spec.gain
                }
            })
            .collect())
    }
}
