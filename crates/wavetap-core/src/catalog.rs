//! The catalog capability every backend manager exposes.

use crate::{Result, TapHandle, TreePath, Value};
use std::collections::HashMap;

/// Name of the stateless enumeration branch.
pub const AVAILABLE: &str = "available";
/// Name of the live-device branch.
pub const OPENED: &str = "opened";

/// Open-call parameters (simple key-value map).
///
/// Recognized keys: `num-channels`, `sample-rate`, `period-size`,
/// `frequency` (generator), `client-name` (JACK). Unknown keys are ignored.
pub type OpenParams = HashMap<String, Value>;

/// Virtual-filesystem-like view onto one backend.
///
/// Two fixed top-level branches: `available/...` enumerates capture sources
/// without side effects, `opened/...` holds one entry per live device.
/// Navigation calls on paths that match no known branch return empty results
/// rather than errors, so callers can iterate blindly.
pub trait Catalog: Send + Sync {
    /// Child names under `path`. Empty for leaves and unknown paths.
    fn children_names(&self, path: &TreePath) -> Vec<String>;

    /// Metadata for the node at `path`. Empty for unknown paths.
    ///
    /// Channel nodes carry a `buffer` value once opened; not-yet-opened
    /// nodes carry a `capabilities` dict telling the caller whether `open`
    /// is meaningful.
    fn metadata(&self, path: &TreePath) -> HashMap<String, Value>;

    /// Single value for the node at `path`, if it has one.
    fn get(&self, path: &TreePath) -> Option<Value>;

    /// Resolve `path` to a device key and channel, lazily creating and
    /// starting the device on first open, and return the channel's tap.
    fn open(&self, path: &TreePath, params: &OpenParams) -> Result<TapHandle>;

    /// Stop every opened device. Called once at shutdown.
    fn dispose(&self);
}

/// The fixed root listing shared by all two-branch catalogs.
pub fn root_children() -> Vec<String> {
    vec![AVAILABLE.to_string(), OPENED.to_string()]
}

/// Standard `capabilities` dict for a not-yet-opened node.
pub fn capabilities(openable: bool, readable: bool, writable: bool) -> Value {
    let mut dict = HashMap::new();
    dict.insert("openable".to_string(), Value::Bool(openable));
    dict.insert("readable".to_string(), Value::Bool(readable));
    dict.insert("writable".to_string(), Value::Bool(writable));
    Value::Dict(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_children() {
        assert_eq!(root_children(), vec!["available", "opened"]);
    }

    #[test]
    fn test_capabilities_dict() {
        let caps = capabilities(true, false, false);
        let dict = caps.as_dict().unwrap();
        assert_eq!(dict["openable"].as_bool(), Some(true));
        assert_eq!(dict["readable"].as_bool(), Some(false));
        assert_eq!(dict["writable"].as_bool(), Some(false));
    }
}
