//! CoreAudio AUHAL capture (macOS).
//!
//! Wraps an input-enabled HAL audio unit per device. The OS invokes the
//! input callback on its own realtime thread with interleaved f32 frames,
//! which are deinterleaved into the per-channel rings.

use crate::cache::DeviceCache;
use crate::{Error, Result};
use coreaudio::audio_unit::audio_format::LinearPcmFlags;
use coreaudio::audio_unit::macos_helpers::{
    audio_unit_from_device_id, get_audio_device_ids, get_default_device_id, get_device_name,
};
use coreaudio::audio_unit::render_callback::{self, data};
use coreaudio::audio_unit::{AudioUnit, Element, SampleFormat, Scope, StreamFormat};
use coreaudio::sys::kAudioUnitProperty_StreamFormat;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavetap_core::{
    capabilities, frames, root_children, Catalog, CaptureDevice, MediatedBuffer, OpenConfig,
    OpenParams, RingBuffer, TapHandle, TreePath, Value, AVAILABLE, OPENED,
};

/// Wrapper to hold an `AudioUnit` in a `Send` context.
///
/// Safe for the same reason as the CPAL stream handle: the device only ever
/// lives behind the manager's `Mutex`, so the unit is never concurrently
/// accessed, and it stays on the thread that created it until teardown.
struct UnitHandle(AudioUnit);

// SAFETY: single-threaded access enforced by Mutex<CoreAudioDevice> in the
// device cache.
unsafe impl Send for UnitHandle {}

/// One AUHAL capture session.
pub struct CoreAudioDevice {
    device_name: String,
    device_id: coreaudio::sys::AudioDeviceID,
    channels: usize,
    sample_rate: u32,
    rings: Vec<Arc<RingBuffer>>,
    unit: Option<UnitHandle>,
    running: Arc<AtomicBool>,
}

impl CoreAudioDevice {
    pub fn open(device_key: &str, config: &OpenConfig) -> Result<Self> {
        config.validate().map_err(Error::Core)?;

        let device_id = resolve_device_id(device_key)?;
        let device_name =
            get_device_name(device_id).unwrap_or_else(|_| device_key.to_string());

        let channels = config.num_channels;
        let sample_rate = config.sample_rate;

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
            device_name,
            device_id,
            channels,
            sample_rate,
            rings,
            unit: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl CaptureDevice for CoreAudioDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        if self.unit.is_some() {
            return Ok(());
        }

        let build = || -> Result<AudioUnit> {
            let mut unit = audio_unit_from_device_id(self.device_id, true)?;

            let format = StreamFormat {
                sample_rate: self.sample_rate as f64,
                sample_format: SampleFormat::F32,
                flags: LinearPcmFlags::IS_FLOAT | LinearPcmFlags::IS_PACKED,
                channels: self.channels as u32,
            };
            let asbd = format.to_asbd();
            // The capture side of the unit is the *output* scope of the
            // input element.
            unit.set_property(
                kAudioUnitProperty_StreamFormat,
                Scope::Output,
                Element::Input,
                Some(&asbd),
            )?;

            let channels = self.channels;
            let rings = self.rings.clone();
            let capacity = self.rings[0].capacity();
            let mut scratch: Vec<Vec<f32>> =
                (0..channels).map(|_| Vec::with_capacity(capacity)).collect();

            type Args = render_callback::Args<data::Interleaved<f32>>;
            unit.set_input_callback(move |args: Args| {
                let Args { data, .. } = args;
                frames::deinterleave_into(data.buffer, channels, &mut scratch);
                for (ring, channel) in rings.iter().zip(&scratch) {
                    ring.write(channel);
                }
                Ok(())
            })?;

            unit.start()?;
            Ok(unit)
        };

        let unit = build().map_err(wavetap_core::Error::from)?;
        self.unit = Some(UnitHandle(unit));
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) {
        // Stop the unit before dropping it so the input callback is quiesced
        // ahead of ring teardown.
        if let Some(mut handle) = self.unit.take() {
            let _ = handle.0.stop();
        }
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

impl Drop for CoreAudioDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

fn resolve_device_id(device_key: &str) -> Result<coreaudio::sys::AudioDeviceID> {
    if device_key == "default" {
        return get_default_device_id(true)
            .ok_or_else(|| Error::DeviceNotFound("no default input device".to_string()));
    }
    let wanted: u32 = device_key
        .parse()
        .map_err(|_| Error::DeviceNotFound(device_key.to_string()))?;
    let ids = get_audio_device_ids()?;
    ids.into_iter()
        .find(|&id| id == wanted)
        .ok_or_else(|| Error::DeviceNotFound(device_key.to_string()))
}

/// Catalog over CoreAudio devices: `available/<device-id>/<name>/<channel>`.
pub struct CoreAudioManager {
    cache: DeviceCache,
}

impl CoreAudioManager {
    pub fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    fn device_ids() -> Vec<u32> {
        match get_audio_device_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!("CoreAudio enumeration failed: {e}");
                Vec::new()
            }
        }
    }
}

impl Default for CoreAudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for CoreAudioManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            [branch] if branch == AVAILABLE => {
                Self::device_ids().iter().map(u32::to_string).collect()
            }
            [branch, id] if branch == AVAILABLE => {
                let Ok(id) = id.parse::<u32>() else {
                    return Vec::new();
                };
                match get_device_name(id) {
                    Ok(name) => vec![name],
                    Err(_) => Vec::new(),
                }
            }
            [branch, _id, _name] if branch == AVAILABLE => {
                vec!["0".to_string(), "1".to_string()]
            }
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_children(rest),
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [branch, _id, _name, _channel] if branch == AVAILABLE => {
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
        let (id, channel) = match path.segments() {
            [branch, id, _name, channel] if branch == AVAILABLE || branch == OPENED => {
                let channel = channel.parse::<usize>().map_err(|_| {
                    wavetap_core::Error::InvalidPath(format!("bad channel in {path}"))
                })?;
                (id.clone(), channel)
            }
            _ => {
                return Err(wavetap_core::Error::InvalidPath(format!(
                    "no CoreAudio device at {path}"
                )))
            }
        };

        let config = OpenConfig::from_params(params);
        self.cache.open_channel(&id, channel, || {
            Ok(Box::new(CoreAudioDevice::open(&id, &config)?))
        })
    }

    fn dispose(&self) {
        self.cache.dispose();
    }
}
