//! Catalogs for the file backends.

use crate::{probe, wav, Error, FileDevice, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use wavetap_core::{
    capabilities, root_children, Catalog, CaptureDevice, OpenParams, TapHandle, TreePath, Value,
    AVAILABLE, OPENED,
};

/// Which decoder a manager drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    /// WAV via hound.
    Wav,
    /// Container probe via Symphonia.
    Probe,
}

impl DecoderKind {
    fn decode(self, path: &Path) -> Result<crate::DecodedAudio> {
        match self {
            Self::Wav => wav::decode(path),
            Self::Probe => probe::decode(path),
        }
    }
}

/// Catalog of loaded files: `opened/<numeric-id>/<channel>`.
///
/// There is no filesystem browse branch; files enter the catalog only
/// through the explicit [`add_file`](FileManager::add_file) operation, so
/// `available` is always empty. Each decoder backend gets its own manager
/// and id space.
pub struct FileManager {
    decoder: DecoderKind,
    files: DashMap<u32, Arc<FileDevice>>,
    next_id: AtomicU32,
}

impl FileManager {
    pub fn new(decoder: DecoderKind) -> Self {
        Self {
            decoder,
            files: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Decode `path` eagerly and register it, returning the assigned id.
    ///
    /// A failed decode registers nothing.
    pub fn add_file(&self, path: impl AsRef<Path>) -> Result<u32> {
        let path = path.as_ref();
        let decoded = self.decoder.decode(path)?;
        let device = FileDevice::from_decoded(path, decoded);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "loaded '{}': {} ch, {} frames @ {} Hz (id {id})",
            path.display(),
            device.num_channels(),
            device.frames(),
            device.sample_rate()
        );
        self.files.insert(id, Arc::new(device));
        Ok(id)
    }

    /// Drop a loaded file, freeing its buffers. Returns whether it existed.
    pub fn remove(&self, id: u32) -> bool {
        self.files.remove(&id).is_some()
    }

    pub fn device(&self, id: u32) -> Option<Arc<FileDevice>> {
        self.files.get(&id).map(|e| Arc::clone(e.value()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn parse_id(segment: &str) -> Option<u32> {
        segment.parse().ok()
    }
}

impl Catalog for FileManager {
    fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => root_children(),
            // No browse branch; the filesystem is someone else's namespace.
            [branch] if branch == AVAILABLE => Vec::new(),
            [branch] if branch == OPENED => {
                let mut ids: Vec<u32> = self.files.iter().map(|e| *e.key()).collect();
                ids.sort_unstable();
                ids.iter().map(u32::to_string).collect()
            }
            [branch, id] if branch == OPENED => {
                match Self::parse_id(id).and_then(|id| self.device(id)) {
                    Some(device) => (0..device.num_channels()).map(|c| c.to_string()).collect(),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        match path.segments() {
            [branch, id] if branch == OPENED => {
                if let Some(device) = Self::parse_id(id).and_then(|id| self.device(id)) {
                    map.insert("name".to_string(), Value::from(device.name()));
                    map.insert(
                        "path".to_string(),
                        Value::from(device.path().display().to_string()),
                    );
                    map.insert("channels".to_string(), Value::from(device.num_channels()));
                    map.insert("sample-rate".to_string(), Value::from(device.sample_rate()));
                    map.insert("frames".to_string(), Value::from(device.frames()));
                }
            }
            [branch, id, channel] if branch == OPENED => {
                if let Some(device) = Self::parse_id(id).and_then(|id| self.device(id)) {
                    if let Some(tap) = channel.parse().ok().and_then(|c| device.tap(c)) {
                        map.insert("buffer".to_string(), Value::Buffer(tap));
                        map.insert("sample-rate".to_string(), Value::from(device.sample_rate()));
                        map.insert("capabilities".to_string(), capabilities(true, true, false));
                    }
                }
            }
            _ => {}
        }
        map
    }

    fn get(&self, path: &TreePath) -> Option<Value> {
        let mut metadata = self.metadata(path);
        metadata.remove("buffer")
    }

    fn open(&self, path: &TreePath, _params: &OpenParams) -> wavetap_core::Result<TapHandle> {
        let (id, channel) = match path.segments() {
            [branch, id, channel] if branch == OPENED => {
                let id = Self::parse_id(id).ok_or_else(|| {
                    wavetap_core::Error::InvalidPath(format!("bad file id in {path}"))
                })?;
                let channel: usize = channel.parse().map_err(|_| {
                    wavetap_core::Error::InvalidPath(format!("bad channel in {path}"))
                })?;
                (id, channel)
            }
            _ => {
                return Err(wavetap_core::Error::InvalidPath(format!(
                    "no loaded file at {path}"
                )))
            }
        };

        let device = self
            .device(id)
            .ok_or_else(|| Error::NotLoaded(format!("id {id}")))
            .map_err(wavetap_core::Error::from)?;
        device
            .tap(channel)
            .ok_or(wavetap_core::Error::ChannelOutOfRange {
                channel,
                channels: device.num_channels(),
            })
    }

    fn dispose(&self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wavetap_core::SampleTap;

    fn write_test_wav(path: &Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            writer.write_sample(i as f32 / frames as f32).unwrap();
            writer.write_sample(-(i as f32) / frames as f32).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_add_file_populates_opened_branch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_test_wav(&path, 32);

        let manager = FileManager::new(DecoderKind::Wav);
        assert!(manager
            .children_names(&TreePath::parse("/opened"))
            .is_empty());
        assert!(manager
            .children_names(&TreePath::parse("/available"))
            .is_empty());

        let id = manager.add_file(&path).unwrap();
        assert_eq!(
            manager.children_names(&TreePath::parse("/opened")),
            vec![id.to_string()]
        );
        assert_eq!(
            manager.children_names(&TreePath::parse(&format!("/opened/{id}"))),
            vec!["0", "1"]
        );

        let metadata = manager.metadata(&TreePath::parse(&format!("/opened/{id}")));
        assert_eq!(metadata["channels"].as_i64(), Some(2));
        assert_eq!(metadata["frames"].as_i64(), Some(32));

        let tap = manager
            .open(&TreePath::parse(&format!("/opened/{id}/0")), &OpenParams::new())
            .unwrap();
        assert_eq!(tap.data().len(), 32);
        assert_eq!(tap.sample_rate(), 44100);
    }

    #[test]
    fn test_failed_decode_registers_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let manager = FileManager::new(DecoderKind::Wav);
        assert!(manager.add_file(&path).is_err());
        assert!(manager.is_empty());
        assert!(manager
            .children_names(&TreePath::parse("/opened"))
            .is_empty());
    }

    #[test]
    fn test_remove_frees_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_test_wav(&path, 8);

        let manager = FileManager::new(DecoderKind::Wav);
        let id = manager.add_file(&path).unwrap();
        assert!(manager.remove(id));
        assert!(!manager.remove(id));
        assert!(manager
            .open(
                &TreePath::parse(&format!("/opened/{id}/0")),
                &OpenParams::new()
            )
            .is_err());
    }

    #[test]
    fn test_ids_are_per_manager_and_monotonic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_test_wav(&path, 8);

        let manager = FileManager::new(DecoderKind::Wav);
        let a = manager.add_file(&path).unwrap();
        let b = manager.add_file(&path).unwrap();
        assert_ne!(a, b);

        let other = FileManager::new(DecoderKind::Probe);
        assert!(other.is_empty());
    }

    #[test]
    fn test_open_unknown_id_fails() {
        let manager = FileManager::new(DecoderKind::Wav);
        let err = manager
            .open(&TreePath::parse("/opened/7/0"), &OpenParams::new())
            .unwrap_err();
        assert!(matches!(err, wavetap_core::Error::DeviceUnavailable(_)));
    }
}
