//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decode error.
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    /// Symphonia probe/decode error.
    #[error("Decode error: {0}")]
    Symphonia(#[from] symphonia::core::errors::Error),

    /// File decoded but yielded nothing usable.
    #[error("Unsupported audio file: {0}")]
    Unsupported(String),

    /// No file registered under the given id.
    #[error("File not loaded: {0}")]
    NotLoaded(String),

    /// Error from the core buffer/catalog layer.
    #[error(transparent)]
    Core(#[from] wavetap_core::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for wavetap_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(e) => e,
            Error::NotLoaded(msg) => Self::DeviceUnavailable(msg),
            other => Self::Decode(other.to_string()),
        }
    }
}
