//! Cross-platform OS-callback capture via CPAL.
//!
//! The OS/audio server invokes the input callback on its own realtime
//! thread; the callback converts to f32, deinterleaves into preallocated
//! scratch, and writes each channel's ring without allocating or blocking.

use crate::cache::DeviceCache;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SupportedStreamConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavetap_core::{
    capabilities, frames, root_children, Catalog, CaptureDevice, MediatedBuffer, OpenConfig,
    OpenParams, RingBuffer, TapHandle, TreePath, Value, AVAILABLE, OPENED,
};

/// Wrapper to hold a `cpal::Stream` in a `Send` context.
///
/// `cpal::Stream` is `!Send` due to platform internals. This is safe because
/// the device is only accessed behind the manager's `Mutex`, ensuring
/// single-threaded access; the stream lives until the device stops and is
/// never moved across threads while active.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

// SAFETY: The stream is only touched behind Mutex<CpalDevice> in the device
// cache, so it's never concurrently accessed.
unsafe impl Send for StreamHandle {}

/// One CPAL input capture session.
pub struct CpalDevice {
    host_name: String,
    device_name: String,
    channels: usize,
    sample_rate: u32,
    rings: Vec<Arc<RingBuffer>>,
    supported: SupportedStreamConfig,
    running: Arc<AtomicBool>,
    _stream: Option<StreamHandle>,
}

impl CpalDevice {
    /// Resolve the host and device named by the catalog path and negotiate
    /// a capture config: f32 at the requested rate when the hardware offers
    /// it, one fallback to i16, otherwise whatever the device defaults to.
    pub fn open(host_name: &str, device_name: &str, config: &OpenConfig) -> Result<Self> {
        config.validate().map_err(Error::Core)?;

        let host = find_host(host_name)?;
        let device = host
            .input_devices()?
            .find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
            .ok_or_else(|| Error::DeviceNotFound(format!("{host_name}/{device_name}")))?;

        let supported = negotiate(&device, config)?;
        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate().0;
        if channels == 0 {
            return Err(Error::InvalidConfig(format!(
                "'{device_name}' reports zero input channels"
            )));
        }
        if sample_rate != config.sample_rate || channels != config.num_channels {
            tracing::debug!(
                "'{device_name}': requested {} ch @ {} Hz, granted {channels} ch @ {sample_rate} Hz",
                config.num_channels,
                config.sample_rate
            );
        }

        let rings = (0..channels)
            .map(|_| {
                Arc::new(RingBuffer::new(
                    config.ring_capacity(),
                    sample_rate,
                    config.period_size,
                ))
            })
            .collect();

        Ok(Self {
            host_name: host_name.to_string(),
            device_name: device_name.to_string(),
            channels,
            sample_rate,
            rings,
            supported,
            running: Arc::new(AtomicBool::new(false)),
            _stream: None,
        })
    }

    fn build_stream<T>(&self, device: &cpal::Device) -> Result<cpal::Stream>
    where
        T: cpal::SizedSample,
        f32: FromSample<T>,
    {
        let channels = self.channels;
        let rings = self.rings.clone();
        let capacity = self.rings[0].capacity();

        // Preallocated staging; the callback must stay allocation-free.
        let mut interleaved: Vec<f32> = Vec::with_capacity(capacity * channels);
        let mut scratch: Vec<Vec<f32>> = (0..channels).map(|_| Vec::with_capacity(capacity)).collect();

        let stream = device.build_input_stream(
            &self.supported.config(),
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                interleaved.clear();
                interleaved.extend(data.iter().map(|&s| f32::from_sample(s)));
                frames::deinterleave_into(&interleaved, channels, &mut scratch);
                for (ring, channel) in rings.iter().zip(&scratch) {
                    ring.write(channel);
                }
            },
            |err| {
                tracing::warn!("input stream error: {err}");
            },
            None,
        )?;

        Ok(stream)
    }
}

impl CaptureDevice for CpalDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        if self._stream.is_some() {
            return Ok(());
        }

        let start = || -> Result<cpal::Stream> {
            let host = find_host(&self.host_name)?;
            let device = host
                .input_devices()?
                .find(|d| {
                    d.name()
                        .map(|n| n == self.device_name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| Error::DeviceNotFound(self.device_name.clone()))?;

            let stream = match self.supported.sample_format() {
                SampleFormat::F32 => self.build_stream::<f32>(&device)?,
                SampleFormat::I16 => self.build_stream::<i16>(&device)?,
                SampleFormat::U16 => self.build_stream::<u16>(&device)?,
                format => {
                    return Err(Error::InvalidConfig(format!(
                        "Unsupported sample format: {format:?}"
                    )));
                }
            };
            stream.play()?;
            Ok(stream)
        };

        let stream = start()?;
        self._stream = Some(StreamHandle(stream));
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the stream unregisters the callback before the rings can
        // go away with the device.
        self._stream = None;
        self.running.store(false, Ordering::Release);
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
        &self.device_name
    }

    fn peak(&self, channel: usize) -> f32 {
        self.rings.get(channel).map(|r| r.peak()).unwrap_or(0.0)
    }
}

fn find_host(name: &str) -> Result<cpal::Host> {
    if name == "default" {
        return Ok(cpal::default_host());
    }
    let id = cpal::available_hosts()
        .into_iter()
        .find(|id| id.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::DeviceNotFound(format!("audio host '{name}'")))?;
    cpal::host_from_id(id).map_err(|e| Error::DeviceNotFound(e.to_string()))
}

/// Pick a supported input config near the request.
///
/// Preference order: f32 at an exact channel match, f32 anywhere, then the
/// same for i16, then the device default. The rate is clamped into the
/// chosen range rather than negotiated further.
fn negotiate(device: &cpal::Device, want: &OpenConfig) -> Result<SupportedStreamConfig> {
    let ranges: Vec<_> = device.supported_input_configs()?.collect();

    for format in [SampleFormat::F32, SampleFormat::I16] {
        let pick = ranges
            .iter()
            .filter(|r| r.sample_format() == format)
            .find(|r| r.channels() as usize == want.num_channels)
            .or_else(|| ranges.iter().find(|r| r.sample_format() == format));

        if let Some(range) = pick {
            if format != SampleFormat::F32 {
                tracing::debug!("falling back to i16 capture format");
            }
            let rate = want
                .sample_rate
                .clamp(range.min_sample_rate().0, range.max_sample_rate().0);
            return Ok(range.clone().with_sample_rate(SampleRate(rate)));
        }
    }

    Ok(device.default_input_config()?)
}

/// Catalog over CPAL hosts: `available/<host>/<device>/<channel>`.
pub struct CpalManager {
    cache: DeviceCache,
}

impl CpalManager {
    pub fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    fn host_names() -> Vec<String> {
        cpal::available_hosts()
            .into_iter()
            .map(|id| id.name().to_string())
            .collect()
    }

    fn device_names(host_name: &str) -> Vec<String> {
        let host = match find_host(host_name) {
            Ok(host) => host,
            Err(_) => return Vec::new(),
        };
        let devices = match host.input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                tracing::debug!("input device enumeration failed: {e}");
                return Vec::new();
            }
        };
        devices.filter_map(|d| d.name().ok()).collect()
    }

    fn channel_names(host_name: &str, device_name: &str) -> Vec<String> {
        let host = match find_host(host_name) {
            Ok(host) => host,
            Err(_) => return Vec::new(),
        };
        let Ok(mut devices) = host.input_devices() else {
            return Vec::new();
        };
        let Some(device) =
            devices.find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
        else {
            return Vec::new();
        };
        let channels = device
            .default_input_config()
            .map(|c| c.channels() as usize)
            .unwrap_or(2);
        (0..channels).map(|c| c.to_string()).collect()
    }
}

impl Default for CpalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for CpalManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            [branch] if branch == AVAILABLE => Self::host_names(),
            [branch, host] if branch == AVAILABLE => Self::device_names(host),
            [branch, host, device] if branch == AVAILABLE => Self::channel_names(host, device),
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_children(rest),
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [branch, _host, _device, _channel] if branch == AVAILABLE => {
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
        let (host, device, channel) = match path.segments() {
            [branch, host, device, channel]
                if branch == AVAILABLE || branch == OPENED =>
            {
                let channel = channel.parse::<usize>().map_err(|_| {
                    wavetap_core::Error::InvalidPath(format!("bad channel in {path}"))
                })?;
                (host.clone(), device.clone(), channel)
            }
            _ => {
                return Err(wavetap_core::Error::InvalidPath(format!(
                    "no capture device at {path}"
                )))
            }
        };

        let config = OpenConfig::from_params(params);
        let key = format!("{host}/{device}");
        self.cache.open_channel(&key, channel, || {
            Ok(Box::new(CpalDevice::open(&host, &device, &config)?))
        })
    }

    fn dispose(&self) {
        self.cache.dispose();
    }
}
