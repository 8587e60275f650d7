use super::RecordError;
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// Decoded WAV contents, one `Vec` per channel.
#[derive(Clone, Debug)]
pub struct WavRecord {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f64>>,
}

/// Read every channel of a WAV file. Integer PCM is scaled to [-1, 1).
pub fn read_wav(path: &Path) -> Result<WavRecord, RecordError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / num_channels;
    let channels = (0..num_channels)
        .map(|ch| {
            interleaved
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .take(frames)
                .copied()
                .collect()
        })
        .collect();

    Ok(WavRecord {
        sample_rate: spec.sample_rate,
        channels,
    })
}
