//! Backend registry owned by the host application.

use std::collections::HashMap;
use wavetap_core::{Catalog, OpenParams, Result, TapHandle, TreePath, Value};

/// Explicitly owned set of backend catalogs.
///
/// One manager per backend, registered at construction and disposed together
/// at shutdown. The engine is the single owner; there are no process-wide
/// singletons. A failed or absent backend simply isn't registered; the rest
/// keep working.
pub struct TapEngine {
    backends: Vec<(String, Box<dyn Catalog>)>,
}

impl TapEngine {
    /// Engine with every backend compiled into this build.
    pub fn new() -> Self {
        let mut engine = Self::empty();

        #[cfg(feature = "capture")]
        {
            engine.register("generator", Box::new(wavetap_capture::GeneratorManager::new()));
            engine.register("cpal", Box::new(wavetap_capture::CpalManager::new()));
            #[cfg(target_os = "linux")]
            engine.register("alsa", Box::new(wavetap_capture::AlsaManager::new()));
            #[cfg(feature = "jack")]
            engine.register("jack", Box::new(wavetap_capture::JackManager::new()));
            #[cfg(target_os = "macos")]
            engine.register("coreaudio", Box::new(wavetap_capture::CoreAudioManager::new()));
        }

        #[cfg(any(feature = "wav", feature = "flac", feature = "mp3", feature = "ogg"))]
        {
            engine.register(
                "file-wav",
                Box::new(wavetap_files::FileManager::new(wavetap_files::DecoderKind::Wav)),
            );
            engine.register(
                "file",
                Box::new(wavetap_files::FileManager::new(wavetap_files::DecoderKind::Probe)),
            );
        }

        engine
    }

    /// Engine with no backends; register your own.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, catalog: Box<dyn Catalog>) {
        self.backends.push((name.into(), catalog));
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn backend(&self, name: &str) -> Option<&dyn Catalog> {
        self.backends
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, catalog)| catalog.as_ref())
    }

    /// Navigation across all backends: the root lists backend names, and
    /// paths below route into the named backend's catalog.
    pub fn children_names(&self, path: &TreePath) -> Vec<String> {
        match path.segments() {
            [] => self.backend_names().iter().map(|n| n.to_string()).collect(),
            [backend, rest @ ..] => match self.backend(backend) {
                Some(catalog) => catalog.children_names(&TreePath::from_segments(rest.to_vec())),
                None => Vec::new(),
            },
        }
    }

    /// Metadata routed into the named backend. Empty for unknown paths.
    pub fn metadata(&self, path: &TreePath) -> HashMap<String, Value> {
        match path.segments() {
            [backend, rest @ ..] => match self.backend(backend) {
                Some(catalog) => catalog.metadata(&TreePath::from_segments(rest.to_vec())),
                None => HashMap::new(),
            },
            _ => HashMap::new(),
        }
    }

    /// Open routed into the named backend.
    pub fn open(&self, path: &TreePath, params: &OpenParams) -> Result<TapHandle> {
        match path.segments() {
            [backend, rest @ ..] => self
                .backend(backend)
                .ok_or_else(|| {
                    wavetap_core::Error::DeviceUnavailable(format!("no backend '{backend}'"))
                })?
                .open(&TreePath::from_segments(rest.to_vec()), params),
            _ => Err(wavetap_core::Error::InvalidPath(path.to_string())),
        }
    }

    /// Stop every device in every backend.
    pub fn dispose(&mut self) {
        for (name, catalog) in &self.backends {
            tracing::debug!("disposing backend '{name}'");
            catalog.dispose();
        }
        self.backends.clear();
    }
}

impl Default for TapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TapEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_engine_has_no_backends() {
        let engine = TapEngine::empty();
        assert!(engine.backend_names().is_empty());
        assert!(engine.children_names(&TreePath::parse("/")).is_empty());
        assert!(engine.backend("generator").is_none());
    }

    #[cfg(feature = "capture")]
    #[test]
    fn test_default_engine_lists_backends_at_root() {
        let mut engine = TapEngine::new();
        let names = engine.children_names(&TreePath::parse("/"));
        assert!(names.contains(&"generator".to_string()));
        assert!(names.contains(&"cpal".to_string()));

        // Routing strips the backend segment.
        assert_eq!(
            engine.children_names(&TreePath::parse("/generator")),
            vec!["available", "opened"]
        );

        engine.dispose();
        assert!(engine.backend_names().is_empty());
    }
}
