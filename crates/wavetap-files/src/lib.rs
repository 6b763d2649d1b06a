//! File-decode backends for the wavetap audio tap engine.
//!
//! Two independent decoders with overlapping format coverage:
//! - [`wav`]: WAV via hound (decoder #1)
//! - [`probe`]: WAV/FLAC/MP3/OGG via Symphonia, per cargo feature
//!   (decoder #2)
//!
//! Both decode eagerly at open time into one immutable
//! [`StaticBuffer`](wavetap_core::StaticBuffer) per channel; consumers read
//! through re-windowable slices, so there is no thread and no ring buffer.

pub mod error;
pub use error::{Error, Result};

/// A fully decoded file, still interleaved.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub interleaved: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.interleaved.len() / self.channels.max(1)
    }
}

pub mod probe;
pub mod wav;

mod device;
pub use device::FileDevice;

mod manager;
pub use manager::{DecoderKind, FileManager};
