//! WAV decoding via hound.
//!
//! The first of the two decoders: WAV only, but every common sample format
//! (8/16/24/32-bit integer and 32-bit float), normalized to f32.

use crate::{DecodedAudio, Error, Result};
use std::path::Path;

/// Decode an entire WAV file to interleaved f32.
pub fn decode(path: &Path) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(Error::Unsupported(format!(
            "{}: zero channels",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(DecodedAudio {
        interleaved,
        channels,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: &[(f32, f32)]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &(l, r) in frames {
            match spec.sample_format {
                hound::SampleFormat::Float => {
                    writer.write_sample(l).unwrap();
                    writer.write_sample(r).unwrap();
                }
                hound::SampleFormat::Int => {
                    writer.write_sample((l * 32767.0) as i16).unwrap();
                    writer.write_sample((r * 32767.0) as i16).unwrap();
                }
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        write_wav(&path, spec, &[(0.25, -0.25), (0.5, -0.5)]);

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.interleaved, vec![0.25, -0.25, 0.5, -0.5]);
    }

    #[test]
    fn test_decode_i16_wav_normalizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[(0.5, -0.5)]);

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.frames(), 1);
        assert_relative_eq!(decoded.interleaved[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(decoded.interleaved[1], -0.5, epsilon = 1e-3);
        assert!(decoded.interleaved.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_missing_file_fails() {
        assert!(decode(Path::new("/no/such/file.wav")).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not a wav file at all").unwrap();
        assert!(decode(&path).is_err());
    }
}
