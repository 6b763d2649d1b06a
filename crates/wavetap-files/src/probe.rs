//! Symphonia decoding.
//!
//! The second decoder: probes the container, then drains the packet stream
//! into interleaved f32. Format coverage (WAV/FLAC/MP3/OGG) follows the
//! enabled cargo features.

use crate::{DecodedAudio, Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode an entire audio file to interleaved f32.
pub fn decode(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Unsupported(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let channels = codec_params
        .channels
        .ok_or_else(|| Error::Unsupported(format!("{}: unknown channel layout", path.display())))?
        .count();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Unsupported(format!("{}: unknown sample rate", path.display())))?;

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut interleaved = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break, // EOF
        };
        if packet.track_id() != track_id {
            continue;
        }

        // Skip undecodable packets instead of failing the whole file.
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!("{}: skipping packet: {e}", path.display());
                continue;
            }
        };

        let mut buf = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    if interleaved.is_empty() {
        return Err(Error::Unsupported(format!(
            "{}: no decodable audio",
            path.display()
        )));
    }

    Ok(DecodedAudio {
        interleaved,
        channels,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.bin");
        std::fs::write(&path, vec![0xAB; 512]).unwrap();
        assert!(decode(&path).is_err());
    }

    #[cfg(feature = "wav")]
    #[test]
    fn test_decode_wav_matches_hound_decoder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ref.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..64i16 {
            writer.write_sample(i * 100).unwrap();
            writer.write_sample(-i * 100).unwrap();
        }
        writer.finalize().unwrap();

        // The two decoders cover overlapping formats; on WAV they must agree.
        let a = decode(&path).unwrap();
        let b = crate::wav::decode(&path).unwrap();
        assert_eq!(a.channels, b.channels);
        assert_eq!(a.sample_rate, b.sample_rate);
        assert_eq!(a.frames(), b.frames());
        for (x, y) in a.interleaved.iter().zip(&b.interleaved) {
            assert!((x - y).abs() < 1e-4);
        }
    }
}
