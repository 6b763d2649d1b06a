//! The backend-agnostic device contract.

use crate::{Result, TapHandle};

/// One capture session: a live hardware stream, a generator, or a loaded
/// file, owning one buffer per channel.
///
/// Construction is backend-specific (`XxxDevice::open(key, &config)`); the
/// set of backends is closed and selected at catalog-registration time.
/// Lifecycle: created stopped, `start()` begins producing, `stop()` joins or
/// deactivates the producer. There is no restart after disposal.
pub trait CaptureDevice: Send {
    /// Begin producing samples. Idempotent while running.
    fn start(&mut self) -> Result<()>;

    /// Stop producing and release the producer thread/callback.
    ///
    /// Must complete before per-channel buffers are torn down, so a
    /// still-registered callback can never touch freed memory.
    fn stop(&mut self);

    /// Tap for one channel, `None` if the channel does not exist.
    fn tap(&self, channel: usize) -> Option<TapHandle>;

    fn num_channels(&self) -> usize;

    /// Negotiated sample rate (what the OS granted, not what was asked).
    fn sample_rate(&self) -> u32;

    fn is_running(&self) -> bool;

    /// Human-readable device identifier.
    fn name(&self) -> &str;

    /// Most recent block peak for a channel, for cheap metering.
    fn peak(&self, channel: usize) -> f32 {
        let _ = channel;
        0.0
    }
}
