//! Opened-device cache shared by the live-backend managers.

use crate::{Error, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use wavetap_core::{CaptureDevice, TapHandle, Value};

/// A cached, started device behind its access mutex.
pub type SharedDevice = Arc<Mutex<Box<dyn CaptureDevice>>>;

/// Map from resolved device key to the single live device for that key.
///
/// Keys may contain `/` (e.g. `host/device`), in which case the `opened/`
/// branch exposes them as nested path segments. Concurrent `open` calls on
/// one key race to a single entry; the losers get the winner's device.
pub struct DeviceCache {
    devices: DashMap<String, SharedDevice>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self {
            devices: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<SharedDevice> {
        self.devices.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.devices.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Take the cached device for `key`, or create and start one, then
    /// return the tap for `channel`.
    ///
    /// A failed create or start leaves nothing cached.
    pub fn open_channel<F>(
        &self,
        key: &str,
        channel: usize,
        create: F,
    ) -> wavetap_core::Result<TapHandle>
    where
        F: FnOnce() -> Result<Box<dyn CaptureDevice>>,
    {
        let device = {
            let entry = self
                .devices
                .entry(key.to_string())
                .or_try_insert_with(|| -> Result<SharedDevice> {
                    let mut device = create()?;
                    device.start().map_err(Error::Core)?;
                    tracing::info!(
                        "opened capture device '{key}' ({} ch @ {} Hz)",
                        device.num_channels(),
                        device.sample_rate()
                    );
                    Ok(Arc::new(Mutex::new(device)))
                })
                .map_err(wavetap_core::Error::from)?;
            Arc::clone(entry.value())
        };

        let guard = device.lock();
        guard
            .tap(channel)
            .ok_or(wavetap_core::Error::ChannelOutOfRange {
                channel,
                channels: guard.num_channels(),
            })
    }

    /// Children listing for the `opened/` branch.
    ///
    /// `rest` is the path after the branch segment: a full key lists its
    /// channel indices, a key prefix lists the next key segments.
    pub fn opened_children(&self, rest: &[String]) -> Vec<String> {
        if !rest.is_empty() {
            if let Some(device) = self.get(&rest.join("/")) {
                let channels = device.lock().num_channels();
                return (0..channels).map(|c| c.to_string()).collect();
            }
        }

        let mut names: Vec<String> = self
            .devices
            .iter()
            .filter_map(|entry| {
                let segments: Vec<&str> = entry.key().split('/').collect();
                if segments.len() > rest.len()
                    && segments.iter().zip(rest).all(|(a, b)| *a == b.as_str())
                {
                    Some(segments[rest.len()].to_string())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Metadata for `opened/` nodes: device nodes report identity and state,
    /// channel nodes carry the live buffer handle.
    pub fn opened_metadata(&self, rest: &[String]) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        if rest.is_empty() {
            return map;
        }

        if let Some(device) = self.get(&rest.join("/")) {
            let device = device.lock();
            map.insert("name".to_string(), Value::from(device.name()));
            map.insert("channels".to_string(), Value::from(device.num_channels()));
            map.insert("sample-rate".to_string(), Value::from(device.sample_rate()));
            map.insert("running".to_string(), Value::from(device.is_running()));
            return map;
        }

        if rest.len() >= 2 {
            let (key_part, channel_part) = rest.split_at(rest.len() - 1);
            let channel = match channel_part[0].parse::<usize>() {
                Ok(c) => c,
                Err(_) => return map,
            };
            if let Some(device) = self.get(&key_part.join("/")) {
                let device = device.lock();
                if let Some(tap) = device.tap(channel) {
                    map.insert("buffer".to_string(), Value::Buffer(tap));
                    map.insert("sample-rate".to_string(), Value::from(device.sample_rate()));
                    map.insert("peak".to_string(), Value::from(device.peak(channel)));
                }
            }
        }
        map
    }

    /// Stop and drop every cached device.
    pub fn dispose(&self) {
        for entry in self.devices.iter() {
            entry.value().lock().stop();
        }
        self.devices.clear();
    }
}

impl Default for DeviceCache {
    fn default() -> Self {
        Self::new()
    }
}
