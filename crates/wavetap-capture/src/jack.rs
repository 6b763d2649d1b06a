//! JACK callback capture.
//!
//! Registers a client with one input port per channel and connects them to
//! the source ports named by the catalog path. JACK delivers each port as a
//! separate mono buffer, so the process callback writes straight into the
//! rings with no deinterleave step.

use crate::cache::DeviceCache;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavetap_core::{
    capabilities, root_children, Catalog, CaptureDevice, MediatedBuffer, OpenConfig, OpenParams,
    RingBuffer, TapHandle, TreePath, Value, AVAILABLE, OPENED,
};

const AUDIO_PORT_TYPE: &str = "32 bit float mono audio";

struct PortWriter {
    ports: Vec<jack::Port<jack::AudioIn>>,
    rings: Vec<Arc<RingBuffer>>,
}

impl jack::ProcessHandler for PortWriter {
    fn process(&mut self, _: &jack::Client, scope: &jack::ProcessScope) -> jack::Control {
        for (port, ring) in self.ports.iter().zip(&self.rings) {
            ring.write(port.as_slice(scope));
        }
        jack::Control::Continue
    }
}

/// One JACK capture session: N registered input ports connected to the
/// source client's capture ports.
pub struct JackDevice {
    name: String,
    sources: Vec<String>,
    own_ports: Vec<String>,
    sample_rate: u32,
    rings: Vec<Arc<RingBuffer>>,
    inactive: Option<(jack::Client, PortWriter)>,
    active: Option<jack::AsyncClient<(), PortWriter>>,
    running: Arc<AtomicBool>,
}

impl JackDevice {
    /// Connect to the JACK server (never starting one) under the
    /// `client-name` from the config and register the input ports.
    ///
    /// `source_client`/`source_port` name the first source port; further
    /// channels take the source client's subsequent capture ports.
    pub fn open(source_client: &str, source_port: &str, config: &OpenConfig) -> Result<Self> {
        config.validate().map_err(Error::Core)?;

        let (client, _status) =
            jack::Client::new(&config.client_name, jack::ClientOptions::NO_START_SERVER)?;
        let sample_rate = client.sample_rate() as u32;
        let period_size = client.buffer_size() as usize;

        // Source ports: the named one first, then the client's remaining
        // outputs in graph order.
        let pattern = format!("{}:.*", regex_escape(source_client));
        let all = client.ports(
            Some(&pattern),
            Some(AUDIO_PORT_TYPE),
            jack::PortFlags::IS_OUTPUT,
        );
        let first = format!("{source_client}:{source_port}");
        if !all.contains(&first) {
            return Err(Error::DeviceNotFound(first));
        }
        let mut sources: Vec<String> = vec![first.clone()];
        sources.extend(all.into_iter().filter(|p| *p != first));
        sources.truncate(config.num_channels);

        let rings: Vec<Arc<RingBuffer>> = (0..sources.len())
            .map(|_| {
                Arc::new(RingBuffer::new(
                    (period_size * 8).max(config.ring_capacity()),
                    sample_rate,
                    period_size,
                ))
            })
            .collect();

        let mut ports = Vec::with_capacity(sources.len());
        let mut own_ports = Vec::with_capacity(sources.len());
        for i in 0..sources.len() {
            let port = client.register_port(&format!("in_{i}"), jack::AudioIn::default())?;
            own_ports.push(port.name()?.to_string());
            ports.push(port);
        }

        let writer = PortWriter {
            ports,
            rings: rings.clone(),
        };

        Ok(Self {
            name: format!("{source_client}:{source_port}"),
            sources,
            own_ports,
            sample_rate,
            rings,
            inactive: Some((client, writer)),
            active: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl CaptureDevice for JackDevice {
    fn start(&mut self) -> wavetap_core::Result<()> {
        if self.active.is_some() {
            return Ok(());
        }
        let (client, writer) = self.inactive.take().ok_or_else(|| {
            wavetap_core::Error::DeviceUnavailable(format!("{} already disposed", self.name))
        })?;

        let active = client
            .activate_async((), writer)
            .map_err(|e| wavetap_core::Error::from(Error::Jack(e)))?;

        for (source, own) in self.sources.iter().zip(&self.own_ports) {
            if let Err(e) = active.as_client().connect_ports_by_name(source, own) {
                tracing::warn!("connect {source} -> {own} failed: {e}");
            }
        }

        self.active = Some(active);
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) {
        // Deactivation deregisters the process callback before the rings are
        // torn down with the device.
        if let Some(active) = self.active.take() {
            let _ = active.deactivate();
        }
        self.running.store(false, Ordering::Release);
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

impl Drop for JackDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Escape a client name for use in a JACK port-name pattern.
fn regex_escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if !c.is_alphanumeric() && c != '_' && c != '-' && c != ' ' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Catalog over the JACK port graph: `available/<client>/<port>/<channel>`.
///
/// A missing or stopped JACK server yields an empty `available` listing
/// rather than an error.
pub struct JackManager {
    cache: DeviceCache,
}

impl JackManager {
    pub fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    /// All source (output-flagged) audio ports, as `(client, port)` pairs.
    fn source_ports() -> Vec<(String, String)> {
        let client = match jack::Client::new("wavetap-scan", jack::ClientOptions::NO_START_SERVER) {
            Ok((client, _)) => client,
            Err(e) => {
                tracing::debug!("JACK unavailable: {e}");
                return Vec::new();
            }
        };
        client
            .ports(None, Some(AUDIO_PORT_TYPE), jack::PortFlags::IS_OUTPUT)
            .into_iter()
            .filter_map(|full| {
                let (client, port) = full.split_once(':')?;
                Some((client.to_string(), port.to_string()))
            })
            .collect()
    }
}

impl Default for JackManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for JackManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            [branch] if branch == AVAILABLE => {
                let mut clients: Vec<String> =
                    Self::source_ports().into_iter().map(|(c, _)| c).collect();
                clients.sort();
                clients.dedup();
                clients
            }
            [branch, client] if branch == AVAILABLE => Self::source_ports()
                .into_iter()
                .filter(|(c, _)| c == client)
                .map(|(_, p)| p)
                .collect(),
            [branch, client, port] if branch == AVAILABLE => {
                let exists = Self::source_ports()
                    .iter()
                    .any(|(c, p)| c == client && p == port);
                if exists {
                    vec!["0".to_string()]
                } else {
                    Vec::new()
                }
            }
            [branch, rest @ ..] if branch == OPENED => self.cache.opened_children(rest),
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [branch, _client, _port, _channel] if branch == AVAILABLE => {
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
        let (client, port, channel) = match path.segments() {
            [branch, client, port, channel] if branch == AVAILABLE || branch == OPENED => {
                let channel = channel.parse::<usize>().map_err(|_| {
                    wavetap_core::Error::InvalidPath(format!("bad channel in {path}"))
                })?;
                (client.clone(), port.clone(), channel)
            }
            _ => {
                return Err(wavetap_core::Error::InvalidPath(format!(
                    "no JACK port at {path}"
                )))
            }
        };

        let config = OpenConfig::from_params(params);
        let key = format!("{client}/{port}");
        self.cache.open_channel(&key, channel, || {
            Ok(Box::new(JackDevice::open(&client, &port, &config)?))
        })
    }

    fn dispose(&self) {
        self.cache.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_is_empty_without_server() {
        // With no JACK server the available branch must be empty, never an
        // error; with one running it lists clients. Either way these calls
        // must not panic.
        let manager = JackManager::new();
        assert_eq!(
            manager.children_names(&TreePath::parse("/")),
            vec!["available", "opened"]
        );
        let _ = manager.children_names(&TreePath::parse("/available"));
        assert!(manager
            .children_names(&TreePath::parse("/opened"))
            .is_empty());
    }

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("system"), "system");
        assert_eq!(regex_escape("a.b+c"), "a\\.b\\+c");
    }
}
