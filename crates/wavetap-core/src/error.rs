//! Error types for wavetap-core.

use thiserror::Error;

/// Error type for catalog and device operations.
///
/// Backend crates keep their own richer error enums and convert into these
/// variants at the catalog boundary, so consumers see one taxonomy no matter
/// which backend produced the failure.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested hardware/port does not exist or the audio service is down.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Requested channel count/rate/format unsupported, fallback exhausted.
    #[error("Configuration rejected: {0}")]
    ConfigRejected(String),

    /// Malformed or unsupported file.
    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Channel {channel} out of range for {channels}-channel device")]
    ChannelOutOfRange { channel: usize, channels: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
