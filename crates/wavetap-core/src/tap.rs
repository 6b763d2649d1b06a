//! The uniform consumer-facing buffer contract.

use std::sync::Arc;

/// A readable tap onto one channel of audio samples.
///
/// Implemented by [`MediatedBuffer`](crate::MediatedBuffer) for live ring
/// buffers and by [`Slice`](crate::Slice) for loaded files, so consumer code
/// is backend-agnostic.
///
/// The lock is advisory: a consumer that skips `try_lock` still reads
/// correctly, it just risks rendering a frame another reader is mid-way
/// through consuming. `try_lock` never blocks.
pub trait SampleTap: Send + Sync + std::fmt::Debug {
    /// Attempt to take the advisory lock. Returns whether it succeeded.
    fn try_lock(&self) -> bool;

    /// Release the advisory lock.
    fn unlock(&self);

    /// Copy out the readable samples, oldest first.
    fn data(&self) -> Vec<f32>;

    /// Sample rate of the underlying stream.
    fn sample_rate(&self) -> u32;
}

/// Shared handle to a tap, as returned by catalog `open` calls.
pub type TapHandle = Arc<dyn SampleTap>;
