//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or rejected configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Requested device/port does not exist.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device was already stopped and cannot be restarted.
    #[error("Device disposed: {0}")]
    Disposed(String),

    /// Failed to enumerate devices.
    #[error("Failed to enumerate audio devices")]
    Devices(#[from] cpal::DevicesError),

    /// Failed to get device name.
    #[error("Failed to get device name")]
    DeviceName(#[from] cpal::DeviceNameError),

    /// Failed to query supported stream configs.
    #[error("Failed to query device configs")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    /// Failed to get device default config.
    #[error("Failed to get audio device config")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// Failed to build stream.
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// Failed to start stream.
    #[error("Failed to start audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// ALSA error.
    #[cfg(target_os = "linux")]
    #[error("ALSA error: {0}")]
    Alsa(#[from] alsa::Error),

    /// JACK error.
    #[cfg(feature = "jack")]
    #[error("JACK error: {0}")]
    Jack(#[from] jack::Error),

    /// CoreAudio error.
    #[cfg(target_os = "macos")]
    #[error("CoreAudio error: {0}")]
    CoreAudio(#[from] coreaudio::Error),

    /// Error from the core buffer/catalog layer.
    #[error(transparent)]
    Core(#[from] wavetap_core::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

// Collapse backend-specific failures into the catalog-level taxonomy at the
// `Catalog` boundary.
impl From<Error> for wavetap_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(e) => e,
            Error::InvalidConfig(msg) => Self::InvalidConfig(msg),
            Error::DeviceNotFound(msg) | Error::Disposed(msg) => Self::DeviceUnavailable(msg),
            e @ (Error::SupportedConfigs(_) | Error::BuildStream(_) | Error::PlayStream(_)) => {
                Self::ConfigRejected(e.to_string())
            }
            other => Self::DeviceUnavailable(other.to_string()),
        }
    }
}
