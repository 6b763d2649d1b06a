//! Direct ALSA capture (Linux).
//!
//! Unlike the callback backends, ALSA capture here is a poll loop: a
//! dedicated thread blocks in `readi`, deinterleaves the returned period and
//! writes each channel's ring. Overruns are recovered in place (the PCM is
//! re-primed and capture continues) rather than tearing the device down.

use crate::cache::DeviceCache;
use crate::{Error, Result};
use alsa::device_name::HintIter;
use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use wavetap_core::{
    capabilities, frames, root_children, Catalog, CaptureDevice, MediatedBuffer, OpenConfig,
    OpenParams, RingBuffer, TapHandle, TreePath, Value, AVAILABLE, OPENED,
};

/// Sample format the PCM was actually configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PcmFormat {
    Float,
    S16,
}

/// One ALSA capture session: `hw:<card>,<device>` plus a reader thread.
pub struct AlsaDevice {
    pcm_name: String,
    channels: usize,
    sample_rate: u32,
    period_size: usize,
    format: PcmFormat,
    rings: Vec<Arc<RingBuffer>>,
    pcm: Option<PCM>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl AlsaDevice {
    /// Open and configure the PCM.
    ///
    /// Requests interleaved float at the configured rate/channels/period and
    /// records what the hardware grants; when the card rejects float the
    /// format falls back once to s16 (normalized to f32 in the reader).
    pub fn open(pcm_name: &str, config: &OpenConfig) -> Result<Self> {
        config.validate().map_err(Error::Core)?;

        let pcm = PCM::new(pcm_name, Direction::Capture, false)
            .map_err(|e| Error::DeviceNotFound(format!("{pcm_name}: {e}")))?;

        let (channels, sample_rate, period_size, format) = {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            let format = match hwp.set_format(Format::float()) {
                Ok(()) => PcmFormat::Float,
                Err(_) => {
                    tracing::debug!("'{pcm_name}' rejected float capture, falling back to s16");
                    hwp.set_format(Format::s16())?;
                    PcmFormat::S16
                }
            };
            let channels = hwp.set_channels_near(config.num_channels as u32)?;
            let sample_rate = hwp.set_rate_near(config.sample_rate, ValueOr::Nearest)?;
            let period_size =
                hwp.set_period_size_near(config.period_size as Frames, ValueOr::Nearest)?;
            pcm.hw_params(&hwp)?;
            (channels as usize, sample_rate, period_size as usize, format)
        };

        if channels != config.num_channels || sample_rate != config.sample_rate {
            tracing::debug!(
                "'{pcm_name}': requested {} ch @ {} Hz, granted {channels} ch @ {sample_rate} Hz",
                config.num_channels,
                config.sample_rate
            );
        }

        let rings = (0..channels)
            .map(|_| {
                Arc::new(RingBuffer::new(
                    (period_size * 8).max(config.ring_capacity()),
                    sample_rate,
                    period_size,
                ))
            })
            .collect();

        Ok(Self {
            pcm_name: pcm_name.to_string(),
            channels,
            sample_rate,
            period_size,
            format,
            rings,
            pcm: Some(pcm),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }
}

impl CaptureDevice for AlsaDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }
        let pcm = self.pcm.take().ok_or_else(|| {
            wavetap_core::Error::DeviceUnavailable(format!("{} already disposed", self.pcm_name))
        })?;

        pcm.start()
            .map_err(|e| wavetap_core::Error::from(Error::Alsa(e)))?;
        self.running.store(true, Ordering::Release);

        let rings = self.rings.clone();
        let running = Arc::clone(&self.running);
        let channels = self.channels;
        let period_size = self.period_size;
        let format = self.format;
        let pcm_name = self.pcm_name.clone();

        let handle = thread::Builder::new()
            .name(format!("wavetap-alsa-{pcm_name}"))
            .spawn(move || {
                capture_loop(pcm, &pcm_name, format, channels, period_size, rings, running);
            })
            .map_err(|e| wavetap_core::Error::DeviceUnavailable(e.to_string()))?;

        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            // The loop notices the flag after at most one period-length read.
            let _ = handle.join();
        }
        self.pcm = None;
    }

    fn tap(&self, channel: usize) -> Option<TapHandle> {
        self.rings
            .get(channel)
            .map(|ring| Arc::new(MediatedBuffer::new(Arc::clone(ring))) as TapHandle)
    }

    fn num_channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn name(&self) -> &str {
        &self.pcm_name
    }

    fn peak(&self, channel: usize) -> f32 {
        self.rings.get(channel).map(|r| r.peak()).unwrap_or(0.0)
    }
}

impl Drop for AlsaDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    pcm: PCM,
    pcm_name: &str,
    format: PcmFormat,
    channels: usize,
    period_size: usize,
    rings: Vec<Arc<RingBuffer>>,
    running: Arc<AtomicBool>,
) {
    let mut staging = vec![0.0f32; period_size * channels];
    let mut staging_i16 = vec![0i16; period_size * channels];
    let mut scratch: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(period_size))
        .collect();

    match format {
        PcmFormat::Float => {
            let io = match pcm.io_f32() {
                Ok(io) => io,
                Err(e) => {
                    tracing::warn!("'{pcm_name}': no f32 I/O channel: {e}");
                    return;
                }
            };
            while running.load(Ordering::Acquire) {
                match io.readi(&mut staging) {
                    Ok(frames_read) => {
                        write_period(&staging[..frames_read * channels], channels, &mut scratch, &rings);
                    }
                    Err(err) => recover(&pcm, pcm_name, err),
                }
            }
        }
        PcmFormat::S16 => {
            let io = match pcm.io_i16() {
                Ok(io) => io,
                Err(e) => {
                    tracing::warn!("'{pcm_name}': no s16 I/O channel: {e}");
                    return;
                }
            };
            while running.load(Ordering::Acquire) {
                match io.readi(&mut staging_i16) {
                    Ok(frames_read) => {
                        frames::i16_slice_to_f32(&staging_i16[..frames_read * channels], &mut staging);
                        write_period(&staging, channels, &mut scratch, &rings);
                    }
                    Err(err) => recover(&pcm, pcm_name, err),
                }
            }
        }
    }
}

fn write_period(
    interleaved: &[f32],
    channels: usize,
    scratch: &mut [Vec<f32>],
    rings: &[Arc<RingBuffer>],
) {
    frames::deinterleave_into(interleaved, channels, scratch);
    for (ring, channel) in rings.iter().zip(scratch.iter()) {
        ring.write(channel);
    }
}

/// Transient overrun policy: log, re-prime, keep capturing.
fn recover(pcm: &PCM, pcm_name: &str, err: alsa::Error) {
    tracing::warn!("'{pcm_name}': capture overrun: {err}, re-priming");
    if pcm.try_recover(err, true).is_err() {
        let _ = pcm.prepare();
        let _ = pcm.start();
    }
}

/// Catalog over ALSA cards: `available/<card>/<device>/<channel>`.
///
/// Cards come from the card iterator (indexes as segments); device numbers
/// come from the PCM name hints of each card. Opening builds a plain
/// `hw:<card>,<device>` PCM name.
pub struct AlsaManager {
    cache: DeviceCache,
}

impl AlsaManager {
    pub fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    fn card_indexes() -> Vec<String> {
        let mut cards = Vec::new();
        for card in alsa::card::Iter::new() {
            match card {
                Ok(card) => cards.push(card.get_index().to_string()),
                Err(e) => tracing::debug!("card enumeration failed: {e}"),
            }
        }
        cards
    }

    fn card_by_index(index: &str) -> Option<alsa::Card> {
        let wanted: i32 = index.parse().ok()?;
        for card in alsa::card::Iter::new().flatten() {
            if card.get_index() == wanted {
                return Some(card);
            }
        }
        None
    }

    /// Capture-capable PCM device numbers on one card, from name hints.
    fn device_numbers(card_index: &str) -> Vec<String> {
        let Some(card) = Self::card_by_index(card_index) else {
            return Vec::new();
        };
        let hints = match HintIter::new_str(Some(&card), "pcm") {
            Ok(hints) => hints,
            Err(e) => {
                tracing::debug!("pcm hints failed for card {card_index}: {e}");
                return Vec::new();
            }
        };

        let mut numbers: Vec<String> = hints
            .filter(|hint| {
                hint.direction.is_none() || hint.direction == Some(Direction::Capture)
            })
            .filter_map(|hint| {
                let name = hint.name?;
                let dev = name.split("DEV=").nth(1)?;
                let dev: String = dev.chars().take_while(|c| c.is_ascii_digit()).collect();
                (!dev.is_empty()).then_some(dev)
            })
            .collect();
        numbers.sort();
        numbers.dedup();
        if numbers.is_empty() {
            numbers.push("0".to_string());
        }
        numbers
    }
}

impl Default for AlsaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for AlsaManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            [branch] if branch == AVAILABLE => Self::card_indexes(),
            [branch, card] if branch == AVAILABLE => Self::device_numbers(card),
            [branch, _card, _device] if branch == AVAILABLE => {
                // Channel count is unknown until the PCM is opened; offer a
                // stereo default without touching the hardware.
                vec!["0".to_string(), "1".to_string()]
            }
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_children(rest),
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [branch, card] if branch == AVAILABLE => {
                let mut map = HashMap::new();
                if let Some(card) = Self::card_by_index(card) {
                    if let Ok(name) = card.get_name() {
                        map.insert("name".to_string(), Value::from(name));
                    }
                }
                map
            }
            [branch, _card, _device, _channel] if branch == AVAILABLE => {
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
        let (card, device, channel) = match path.segments() {
            [branch, card, device, channel] if branch == AVAILABLE || branch == OPENED => {
                let channel = channel.parse::<usize>().map_err(|_| {
                    wavetap_core::Error::InvalidPath(format!("bad channel in {path}"))
                })?;
                (card.clone(), device.clone(), channel)
            }
            _ => {
                return Err(wavetap_core::Error::InvalidPath(format!(
                    "no PCM at {path}"
                )))
            }
        };

        let config = OpenConfig::from_params(params);
        let key = format!("{card}/{device}");
        let pcm_name = format!("hw:{card},{device}");
        self.cache.open_channel(&key, channel, || {
            Ok(Box::new(AlsaDevice::open(&pcm_name, &config)?))
        })
    }

    fn dispose(&self) {
        self.cache.dispose();
    }
}
