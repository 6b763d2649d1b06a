//! Live-capture backends for the wavetap audio tap engine.
//!
//! Every backend normalizes into the same contract: a
//! [`CaptureDevice`](wavetap_core::CaptureDevice) owning one ring buffer per
//! channel, fronted by a [`Catalog`](wavetap_core::Catalog) manager with the
//! two-branch `available`/`opened` namespace.
//!
//! Backends:
//! - [`CpalManager`]: cross-platform OS-callback capture (always available)
//! - [`AlsaManager`]: direct ALSA poll-loop capture (Linux)
//! - [`JackManager`]: JACK callback capture (`jack` feature)
//! - [`CoreAudioManager`]: AUHAL callback capture (macOS)
//! - [`GeneratorManager`]: synthetic sine/square/triangle sources

pub mod error;
pub use error::{Error, Result};

mod cache;
pub use cache::{DeviceCache, SharedDevice};

pub mod generator;
pub use generator::{GeneratorDevice, GeneratorManager, Waveform};

pub mod cpal;
pub use self::cpal::{CpalDevice, CpalManager};

#[cfg(target_os = "linux")]
pub mod alsa;
#[cfg(target_os = "linux")]
pub use self::alsa::{AlsaDevice, AlsaManager};

#[cfg(feature = "jack")]
pub mod jack;
#[cfg(feature = "jack")]
pub use self::jack::{JackDevice, JackManager};

#[cfg(target_os = "macos")]
pub mod coreaudio;
#[cfg(target_os = "macos")]
pub use self::coreaudio::{CoreAudioDevice, CoreAudioManager};
