//! Fixed-capacity circular sample store.
//!
//! Single writer, many readers. Writes never block and never fail; once the
//! buffer is full the oldest samples are silently overwritten. Reads copy
//! out a window of the most recent samples without consuming anything.

use atomic_float::AtomicF32;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct RingState {
    storage: Vec<f32>,
    write_pos: usize,
    available: usize,
}

/// Lossy circular buffer for one channel of float samples.
///
/// The backing array and cursors are mutated only under the internal mutex;
/// readers get copies, never references, so producer and consumer stay fully
/// decoupled. The advisory lock flag lives beside the mutex and is shared by
/// every [`MediatedBuffer`](crate::MediatedBuffer) wrapping this ring.
#[derive(Debug)]
pub struct RingBuffer {
    state: Mutex<RingState>,
    capacity: usize,
    sample_rate: u32,
    period_size: usize,
    lock_flag: Arc<AtomicBool>,
    peak: AtomicF32,
}

impl RingBuffer {
    /// Create a ring holding up to `capacity` samples.
    ///
    /// The storage is allocated once here; `write` never allocates.
    pub fn new(capacity: usize, sample_rate: u32, period_size: usize) -> Self {
        Self {
            state: Mutex::new(RingState {
                storage: vec![0.0; capacity],
                write_pos: 0,
                available: 0,
            }),
            capacity,
            sample_rate,
            period_size,
            lock_flag: Arc::new(AtomicBool::new(false)),
            peak: AtomicF32::new(0.0),
        }
    }

    /// Append samples, overwriting the oldest once full.
    ///
    /// Never blocks beyond the brief mutex hold, never fails; a zero-length
    /// write is a no-op. Writing more than `capacity` samples at once keeps
    /// only the most recent `capacity` of them.
    pub fn write(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let mut block_peak = 0.0f32;
        for &s in samples {
            block_peak = block_peak.max(s.abs());
        }

        // Only the tail can survive when the block exceeds capacity.
        let src = if samples.len() > self.capacity {
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };
        let n = src.len();

        let mut state = self.state.lock();
        let pos = state.write_pos;
        let first = (self.capacity - pos).min(n);
        state.storage[pos..pos + first].copy_from_slice(&src[..first]);
        state.storage[..n - first].copy_from_slice(&src[first..]);
        state.write_pos = (pos + n) % self.capacity;
        state.available = (state.available + n).min(self.capacity);
        drop(state);

        self.peak.store(block_peak, Ordering::Relaxed);
    }

    /// Copy out the most recent samples in chronological order.
    ///
    /// This is a window, not a queue: repeated reads before the next write
    /// return identical data.
    pub fn read_all(&self) -> Vec<f32> {
        let state = self.state.lock();
        let mut out = Vec::with_capacity(state.available);
        let start = (state.write_pos + self.capacity - state.available) % self.capacity;
        let first = (self.capacity - start).min(state.available);
        out.extend_from_slice(&state.storage[start..start + first]);
        out.extend_from_slice(&state.storage[..state.available - first]);
        out
    }

    /// Forget all buffered samples without touching the storage.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.available = 0;
        self.peak.store(0.0, Ordering::Relaxed);
    }

    /// Number of samples a read would currently return.
    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Expected write granularity in samples.
    pub fn period_size(&self) -> usize {
        self.period_size
    }

    /// Absolute peak of the most recently written block.
    pub fn peak(&self) -> f32 {
        self.peak.load(Ordering::Relaxed)
    }

    /// The advisory lock flag shared with mediators wrapping this ring.
    pub(crate) fn lock_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.lock_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_within_capacity_read_back_in_order() {
        let ring = RingBuffer::new(8, 48000, 4);
        ring.write(&[1.0, 2.0, 3.0]);
        ring.write(&[4.0, 5.0]);
        assert_eq!(ring.read_all(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_overflow_keeps_most_recent_capacity_samples() {
        let ring = RingBuffer::new(4, 48000, 4);
        for i in 0..10 {
            ring.write(&[i as f32]);
        }
        assert_eq!(ring.read_all(), vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(ring.available(), 4);
    }

    #[test]
    fn test_single_write_larger_than_capacity() {
        let ring = RingBuffer::new(4, 48000, 4);
        ring.write(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ring.read_all(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ring.available(), 4);
    }

    #[test]
    fn test_read_is_a_window_not_a_queue() {
        let ring = RingBuffer::new(8, 48000, 4);
        ring.write(&[1.0, 2.0]);
        assert_eq!(ring.read_all(), ring.read_all());
    }

    #[test]
    fn test_zero_length_write_is_noop() {
        let ring = RingBuffer::new(4, 48000, 4);
        ring.write(&[]);
        assert!(ring.read_all().is_empty());
        assert_eq!(ring.available(), 0);
    }

    #[test]
    fn test_clear_drops_window() {
        let ring = RingBuffer::new(4, 48000, 4);
        ring.write(&[1.0, 2.0, 3.0]);
        ring.clear();
        assert!(ring.read_all().is_empty());
        ring.write(&[9.0]);
        assert_eq!(ring.read_all(), vec![9.0]);
    }

    #[test]
    fn test_peak_tracks_last_block() {
        let ring = RingBuffer::new(8, 48000, 4);
        ring.write(&[0.25, -0.75]);
        assert_eq!(ring.peak(), 0.75);
        ring.write(&[0.1]);
        assert_eq!(ring.peak(), 0.1);
    }

    #[test]
    fn test_concurrent_writer_and_reader() {
        let ring = Arc::new(RingBuffer::new(1024, 48000, 64));
        let writer = Arc::clone(&ring);
        let handle = std::thread::spawn(move || {
            for i in 0..200 {
                writer.write(&[i as f32; 64]);
            }
        });
        for _ in 0..50 {
            let data = ring.read_all();
            assert!(data.len() <= 1024);
        }
        handle.join().unwrap();
        assert_eq!(ring.available(), 1024);
    }
}
