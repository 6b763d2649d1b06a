//! Synthetic signal generator backend.
//!
//! Produces sine/square/triangle test signals on a spawned thread, one
//! period-sized block per iteration, so consumers can be exercised without
//! any audio hardware.

use crate::cache::DeviceCache;
use crate::{Error, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wavetap_core::{
    capabilities, root_children, Catalog, CaptureDevice, MediatedBuffer, OpenConfig, OpenParams,
    RingBuffer, TapHandle, TreePath, Value, AVAILABLE, OPENED,
};

/// Waveform kinds the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 3] = [Waveform::Sine, Waveform::Square, Waveform::Triangle];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Triangle => "triangle",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Self::Sine),
            "square" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    /// Sample value for a phase in `[0, 2π)`.
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => phase.sin(),
            Self::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Triangle => {
                let t = phase / TAU;
                if t < 0.25 {
                    4.0 * t
                } else if t < 0.75 {
                    2.0 - 4.0 * t
                } else {
                    4.0 * t - 4.0
                }
            }
        }
    }
}

/// One running generator: a thread writing analytic blocks into every
/// channel's ring buffer.
pub struct GeneratorDevice {
    name: String,
    waveform: Waveform,
    frequency: f32,
    sample_rate: u32,
    period_size: usize,
    rings: Vec<Arc<RingBuffer>>,
    running: Arc<AtomicBool>,
    shutdown_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl GeneratorDevice {
    pub fn open(waveform: Waveform, config: &OpenConfig) -> Result<Self> {
        config.validate().map_err(Error::Core)?;

        let rings = (0..config.num_channels)
            .map(|_| {
                Arc::new(RingBuffer::new(
                    config.ring_capacity(),
                    config.sample_rate,
                    config.period_size,
                ))
            })
            .collect();

        Ok(Self {
            name: waveform.name().to_string(),
            waveform,
            frequency: config.frequency,
            sample_rate: config.sample_rate,
            period_size: config.period_size,
            rings,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx: None,
            thread: None,
        })
    }
}

impl CaptureDevice for GeneratorDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);
        self.running.store(true, Ordering::Release);

        let waveform = self.waveform;
        let frequency = self.frequency;
        let sample_rate = self.sample_rate;
        let period_size = self.period_size;
        let rings = self.rings.clone();
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name(format!("wavetap-gen-{}", waveform.name()))
            .spawn(move || {
                let phase_inc = TAU * frequency / sample_rate as f32;
                let period = Duration::from_secs_f64(period_size as f64 / sample_rate as f64);
                let mut phase = 0.0f32;
                let mut block = vec![0.0f32; period_size];

                while running.load(Ordering::Acquire) {
                    for sample in block.iter_mut() {
                        *sample = waveform.sample(phase);
                        phase += phase_inc;
                        if phase >= TAU {
                            phase -= TAU;
                        }
                    }
                    // Same block to every channel keeps them frame-aligned.
                    for ring in &rings {
                        ring.write(&block);
                    }

                    // Sleep one period; a shutdown message wakes us early.
                    match shutdown_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| wavetap_core::Error::DeviceUnavailable(e.to_string()))?;

        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn tap(&self, channel: usize) -> Option<TapHandle> {
        self.rings
            .get(channel)
            .map(|ring| Arc::new(MediatedBuffer::new(Arc::clone(ring))) as TapHandle)
    }

    fn num_channels(&self) -> usize {
        self.rings.len()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn peak(&self, channel: usize) -> f32 {
        self.rings.get(channel).map(|r| r.peak()).unwrap_or(0.0)
    }
}

impl Drop for GeneratorDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Catalog of synthetic sources: `available/<kind>/0` for each waveform.
pub struct GeneratorManager {
    cache: DeviceCache,
}

impl GeneratorManager {
    pub fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    fn resolve(path: &TreePath) -> Option<(Waveform, usize)> {
        if !matches!(path.first(), Some(AVAILABLE) | Some(OPENED)) {
            return None;
        }
        let waveform = Waveform::parse(path.get(1)?)?;
        let channel = match path.get(2) {
            Some(segment) => segment.parse::<usize>().ok()?,
            None => 0,
        };
        Some((waveform, channel))
    }
}

impl Default for GeneratorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for GeneratorManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            [branch] if branch == AVAILABLE => {
                Waveform::ALL.iter().map(|w| w.name().to_string()).collect()
            }
            [branch, kind] if branch == AVAILABLE && Waveform::parse(kind).is_some() => {
                vec!["0".to_string()]
            }
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_children(rest),
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [branch, kind, _channel] if branch == AVAILABLE && Waveform::parse(kind).is_some() => {
                let mut map = HashMap::new();
                map.insert("capabilities".to_string(), capabilities(true, false, false));
                map
            }
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_metadata(rest),
            _ => HashMap::new(),
        }
    }

    fn get(&self, path: &TreePath) -> Option<Value> {
        let mut metadata = self.metadata(path);
        metadata.remove("buffer")
    }

    fn open(&self, path: &TreePath, params: &OpenParams) -> wavetap_core::Result<TapHandle> {
        let (waveform, channel) = Self::resolve(path).ok_or_else(|| {
            wavetap_core::Error::InvalidPath(format!("no generator at {path}"))
        })?;
        let config = OpenConfig::from_params(params);
        self.cache.open_channel(waveform.name(), channel, || {
            Ok(Box::new(GeneratorDevice::open(waveform, &config)?))
        })
    }

    fn dispose(&self) {
        self.cache.dispose();
    }
}
