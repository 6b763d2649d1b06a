//! File backend integration tests.
//!
//! Writes reference WAV fixtures with hound, loads them through both
//! decoder backends, and reads them back through the catalog namespace.
//!
//! Run with:
//! ```bash
//! cargo test -p wavetap --test file_decode_tests --features "wav"
//! ```

#![cfg(feature = "wav")]

use std::path::Path;
use tempfile::tempdir;
use wavetap::prelude::*;
use wavetap::{DecoderKind, FileManager, Slice};

/// 2-channel fixture where channel 0 ramps up and channel 1 ramps down.
fn write_ramp_wav(path: &Path, frames: usize) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let v = i as f32 / frames as f32;
        writer.write_sample(v).unwrap();
        writer.write_sample(-v).unwrap();
    }
    writer.finalize().unwrap();
}

/// Both decoders load the same WAV to the same per-channel data.
#[test]
fn test_decoders_agree_on_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    write_ramp_wav(&path, 128);

    let wav = FileManager::new(DecoderKind::Wav);
    let probe = FileManager::new(DecoderKind::Probe);

    let id_a = wav.add_file(&path).expect("hound decode");
    let id_b = probe.add_file(&path).expect("symphonia decode");

    for channel in 0..2 {
        let a = wav
            .open(
                &TreePath::parse(&format!("/opened/{id_a}/{channel}")),
                &OpenParams::new(),
            )
            .unwrap();
        let b = probe
            .open(
                &TreePath::parse(&format!("/opened/{id_b}/{channel}")),
                &OpenParams::new(),
            )
            .unwrap();
        let (da, db) = (a.data(), b.data());
        assert_eq!(da.len(), 128);
        assert_eq!(da.len(), db.len());
        for (x, y) in da.iter().zip(&db) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

/// Channel separation survives the interleaved decode.
#[test]
fn test_channels_deinterleaved_correctly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    write_ramp_wav(&path, 64);

    let manager = FileManager::new(DecoderKind::Wav);
    let id = manager.add_file(&path).unwrap();

    let left = manager
        .open(&TreePath::parse(&format!("/opened/{id}/0")), &OpenParams::new())
        .unwrap();
    let right = manager
        .open(&TreePath::parse(&format!("/opened/{id}/1")), &OpenParams::new())
        .unwrap();

    for (i, (l, r)) in left.data().iter().zip(&right.data()).enumerate() {
        assert!(*l >= 0.0, "left sample {i} should be non-negative");
        assert!(*r <= 0.0, "right sample {i} should be non-positive");
        assert!((l + r).abs() < 1e-6, "channels should mirror");
    }
}

/// Slices windows clamp and re-window over the loaded data.
#[test]
fn test_slice_windows_over_loaded_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ramp.wav");
    write_ramp_wav(&path, 100);

    let manager = FileManager::new(DecoderKind::Wav);
    let id = manager.add_file(&path).unwrap();
    let device = manager.device(id).unwrap();

    let mediator = device.mediator(0).unwrap();
    let slice: std::sync::Arc<Slice> = mediator.open(90, 50);
    assert_eq!(slice.data().len(), 10, "window past the end clamps");

    slice.set_range(25, 0);
    assert_eq!(slice.data().len(), 75, "zero length means to-end");

    slice.set_range(10, 20);
    let window = slice.data();
    assert_eq!(window.len(), 20);
    assert!((window[0] - 0.1).abs() < 1e-5);
}

/// File devices appear in the engine's namespace and go away on dispose.
#[test]
fn test_engine_routes_file_backend() {
    let mut engine = TapEngine::new();
    assert!(engine.backend("file").is_some());
    assert!(engine.backend("file-wav").is_some());

    // File backends have no browse branch.
    assert!(engine
        .children_names(&TreePath::parse("/file/available"))
        .is_empty());
    assert!(engine
        .children_names(&TreePath::parse("/file/opened"))
        .is_empty());

    engine.dispose();
    assert!(engine.backend_names().is_empty());
}
