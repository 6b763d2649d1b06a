//! Loaded-file devices.

use crate::DecodedAudio;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wavetap_core::{frames, CaptureDevice, StaticBuffer, StaticBufferMediator, TapHandle};

/// One fully decoded file: a static buffer and mediator per channel.
///
/// There is no producer, since decoding happened eagerly at open time, so
/// `start`/`stop` are no-ops and taps are re-windowable slices over
/// immutable data.
pub struct FileDevice {
    name: String,
    path: PathBuf,
    sample_rate: u32,
    frames: usize,
    mediators: Vec<StaticBufferMediator>,
}

impl FileDevice {
    pub fn from_decoded(path: &Path, decoded: DecodedAudio) -> Self {
        let frames = decoded.frames();
        let mediators = frames::deinterleave(&decoded.interleaved, decoded.channels)
            .into_iter()
            .map(|samples| {
                StaticBufferMediator::new(Arc::new(StaticBuffer::new(
                    samples,
                    decoded.sample_rate,
                    path,
                )))
            })
            .collect();

        Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            path: path.to_path_buf(),
            sample_rate: decoded.sample_rate,
            frames,
            mediators,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// The mediator for one channel, for consumers that want to issue their
    /// own windowed slices.
    pub fn mediator(&self, channel: usize) -> Option<&StaticBufferMediator> {
        self.mediators.get(channel)
    }
}

impl CaptureDevice for FileDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn tap(&self, channel: usize) -> Option<TapHandle> {
        self.mediators
            .get(channel)
            .map(|m| m.open(0, 0) as TapHandle)
    }

    fn num_channels(&self) -> usize {
        self.mediators.len()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_running(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavetap_core::SampleTap;

    #[test]
    fn test_from_decoded_deinterleaves() {
        let decoded = DecodedAudio {
            interleaved: vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3],
            channels: 2,
            sample_rate: 44100,
        };
        let device = FileDevice::from_decoded(Path::new("clip.wav"), decoded);

        assert_eq!(device.num_channels(), 2);
        assert_eq!(device.frames(), 3);
        assert_eq!(device.sample_rate(), 44100);
        assert_eq!(device.name(), "clip.wav");
        assert!(!device.is_running());

        let left = device.tap(0).unwrap();
        let right = device.tap(1).unwrap();
        assert_eq!(left.data(), vec![0.1, 0.2, 0.3]);
        assert_eq!(right.data(), vec![-0.1, -0.2, -0.3]);
        assert!(device.tap(2).is_none());
    }

    #[test]
    fn test_taps_are_independent_slices() {
        let decoded = DecodedAudio {
            interleaved: (0..8).map(|i| i as f32).collect(),
            channels: 1,
            sample_rate: 48000,
        };
        let device = FileDevice::from_decoded(Path::new("mono.wav"), decoded);

        let a = device.tap(0).unwrap();
        let b = device.tap(0).unwrap();
        assert_eq!(a.data().len(), 8);
        assert_eq!(b.data().len(), 8);
        assert_eq!(device.mediator(0).unwrap().slice_count(), 2);
    }
}
