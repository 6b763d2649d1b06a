//! # wavetap - Audio Tap Engine
//!
//! Live and file-based audio sample streams behind one backend-agnostic
//! abstraction, for visualizers, meters, and recorders.
//!
//! ## Architecture
//!
//! wavetap is an umbrella crate coordinating:
//! - **wavetap-core** - ring buffer / mediator / static buffer primitives,
//!   the [`SampleTap`] read contract, and the [`Catalog`] navigation
//!   capability
//! - **wavetap-capture** - live backends (cpal, ALSA, JACK, CoreAudio) and
//!   the synthetic generator
//! - **wavetap-files** - eager file decoders (hound and Symphonia) exposing
//!   loaded files as re-windowable slices
//!
//! ## Quick Start
//!
//! ```ignore
//! use wavetap::prelude::*;
//!
//! let mut engine = TapEngine::new();
//!
//! // Open channel 0 of a 440 Hz sine source.
//! let tap = engine.open(
//!     &TreePath::parse("/generator/available/sine/0"),
//!     &OpenParams::new(),
//! )?;
//!
//! // Render loop: skip the frame if another consumer holds the tap.
//! if tap.try_lock() {
//!     let samples = tap.data();
//!     tap.unlock();
//! }
//!
//! engine.dispose();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - live capture plus all file formats
//! - `capture` - live-capture backends and the generator
//! - `jack` - JACK callback backend
//! - `wav` / `flac` / `mp3` / `ogg` - per-format file decoding
//! - `files` - all formats

/// Re-export of wavetap-core for direct access
pub use wavetap_core as core;

pub use wavetap_core::{
    capabilities,
    frames,
    root_children,
    CaptureDevice,
    Catalog,
    // Error
    Error,
    MediatedBuffer,
    OpenConfig,
    OpenParams,
    Result,
    // Buffer primitives
    RingBuffer,
    // The uniform read contract
    SampleTap,
    Slice,
    StaticBuffer,
    StaticBufferMediator,
    TapHandle,
    // Navigation
    TreePath,
    Value,
    AVAILABLE,
    OPENED,
};

#[cfg(feature = "capture")]
pub use wavetap_capture as capture;

#[cfg(feature = "capture")]
pub use wavetap_capture::{CpalManager, GeneratorManager, Waveform};

#[cfg(all(feature = "capture", target_os = "linux"))]
pub use wavetap_capture::AlsaManager;

#[cfg(all(feature = "capture", feature = "jack"))]
pub use wavetap_capture::JackManager;

#[cfg(all(feature = "capture", target_os = "macos"))]
pub use wavetap_capture::CoreAudioManager;

#[cfg(any(feature = "wav", feature = "flac", feature = "mp3", feature = "ogg"))]
pub use wavetap_files as files;

#[cfg(any(feature = "wav", feature = "flac", feature = "mp3", feature = "ogg"))]
pub use wavetap_files::{DecoderKind, FileDevice, FileManager};

mod engine;
pub use engine::TapEngine;

/// Common imports for consumers.
pub mod prelude {
    pub use crate::engine::TapEngine;
    pub use wavetap_core::{
        Catalog, Error, OpenConfig, OpenParams, Result, SampleTap, TapHandle, TreePath, Value,
    };

    #[cfg(feature = "capture")]
    pub use wavetap_capture::Waveform;
}
