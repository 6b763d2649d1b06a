//! Consumer-side handle onto a [`RingBuffer`].

use crate::{RingBuffer, SampleTap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-consumer handle onto a live ring buffer.
///
/// Multiple mediators may wrap the same ring (fan-out to several consumers).
/// They all share one advisory lock flag owned by the ring, so at most one
/// handle holds the lock at a time; the losers skip a frame instead of
/// reading a buffer another consumer is mid-way through.
#[derive(Debug)]
pub struct MediatedBuffer {
    ring: Arc<RingBuffer>,
    lock_flag: Arc<AtomicBool>,
}

impl MediatedBuffer {
    pub fn new(ring: Arc<RingBuffer>) -> Self {
        let lock_flag = ring.lock_flag();
        Self { ring, lock_flag }
    }

    /// The wrapped ring buffer.
    pub fn ring(&self) -> &Arc<RingBuffer> {
        &self.ring
    }

    /// Samples a read would currently return.
    pub fn available(&self) -> usize {
        self.ring.available()
    }
}

impl SampleTap for MediatedBuffer {
    fn try_lock(&self) -> bool {
        self.lock_flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn unlock(&self) {
        self.lock_flag.store(false, Ordering::Release);
    }

    fn data(&self) -> Vec<f32> {
        self.ring.read_all()
    }

    fn sample_rate(&self) -> u32 {
        self.ring.sample_rate()
    }
}
