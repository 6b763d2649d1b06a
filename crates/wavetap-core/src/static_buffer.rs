//! Immutable per-channel sample arrays for loaded files.

use crate::SampleTap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One channel of a fully decoded file.
///
/// Never mutated after construction, so it is safe to read from any number
/// of threads without coordination.
#[derive(Debug)]
pub struct StaticBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    source: PathBuf,
}

impl StaticBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, source: impl Into<PathBuf>) -> Self {
        Self {
            samples,
            sample_rate,
            source: source.into(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The file this channel was decoded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[derive(Debug)]
struct Window {
    start: usize,
    len: usize,
}

/// Bounded, re-windowable read view onto a [`StaticBuffer`].
///
/// A window length of zero means "to the end of the buffer". Windows that
/// run past the end are clamped rather than failing. Locking is a no-op kept
/// only for interface symmetry with [`MediatedBuffer`](crate::MediatedBuffer).
#[derive(Debug)]
pub struct Slice {
    buffer: Arc<StaticBuffer>,
    window: Mutex<Window>,
}

impl Slice {
    pub fn new(buffer: Arc<StaticBuffer>, start: usize, len: usize) -> Self {
        Self {
            buffer,
            window: Mutex::new(Window { start, len }),
        }
    }

    /// Re-window without creating a new slice. `len == 0` means to-end.
    pub fn set_range(&self, start: usize, len: usize) {
        let mut window = self.window.lock();
        window.start = start;
        window.len = len;
    }

    /// Current window as a clamped `(start, end)` pair.
    pub fn bounds(&self) -> (usize, usize) {
        let window = self.window.lock();
        let total = self.buffer.len();
        let start = window.start.min(total);
        let end = if window.len == 0 {
            total
        } else {
            (window.start + window.len).min(total)
        };
        (start, end)
    }

    pub fn buffer(&self) -> &Arc<StaticBuffer> {
        &self.buffer
    }
}

impl SampleTap for Slice {
    fn try_lock(&self) -> bool {
        true
    }

    fn unlock(&self) {}

    fn data(&self) -> Vec<f32> {
        let (start, end) = self.bounds();
        self.buffer.samples()[start..end].to_vec()
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }
}

/// Issues and tracks [`Slice`] views onto one [`StaticBuffer`].
///
/// Each consumer gets its own slice with an independent offset/length, all
/// reading the same immutable backing array.
pub struct StaticBufferMediator {
    buffer: Arc<StaticBuffer>,
    slices: Mutex<Vec<Arc<Slice>>>,
}

impl StaticBufferMediator {
    pub fn new(buffer: Arc<StaticBuffer>) -> Self {
        Self {
            buffer,
            slices: Mutex::new(Vec::new()),
        }
    }

    /// Issue a new slice over `[start, start + len)`, `len == 0` = to-end.
    pub fn open(&self, start: usize, len: usize) -> Arc<Slice> {
        let slice = Arc::new(Slice::new(Arc::clone(&self.buffer), start, len));
        self.slices.lock().push(Arc::clone(&slice));
        slice
    }

    pub fn slice_count(&self) -> usize {
        self.slices.lock().len()
    }

    pub fn buffer(&self) -> &Arc<StaticBuffer> {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_0_to_9() -> Arc<StaticBuffer> {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        Arc::new(StaticBuffer::new(samples, 44100, "test.wav"))
    }

    #[test]
    fn test_zero_length_means_to_end() {
        let mediator = StaticBufferMediator::new(buffer_0_to_9());
        let slice = mediator.open(6, 0);
        assert_eq!(slice.data(), vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_out_of_bounds_window_clamps() {
        let mediator = StaticBufferMediator::new(buffer_0_to_9());
        let slice = mediator.open(8, 5);
        assert_eq!(slice.data(), vec![8.0, 9.0]);

        let past_end = mediator.open(20, 4);
        assert!(past_end.data().is_empty());
    }

    #[test]
    fn test_set_range_rewindows() {
        let mediator = StaticBufferMediator::new(buffer_0_to_9());
        let slice = mediator.open(0, 2);
        assert_eq!(slice.data(), vec![0.0, 1.0]);
        slice.set_range(3, 2);
        assert_eq!(slice.data(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_independent_slices_share_backing() {
        let mediator = StaticBufferMediator::new(buffer_0_to_9());
        let a = mediator.open(0, 3);
        let b = mediator.open(5, 0);
        assert_eq!(a.data(), vec![0.0, 1.0, 2.0]);
        assert_eq!(b.data(), vec![5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(mediator.slice_count(), 2);
    }

    #[test]
    fn test_locking_is_noop() {
        let mediator = StaticBufferMediator::new(buffer_0_to_9());
        let slice = mediator.open(0, 0);
        assert!(slice.try_lock());
        assert!(slice.try_lock());
        slice.unlock();
        assert_eq!(slice.sample_rate(), 44100);
    }
}
