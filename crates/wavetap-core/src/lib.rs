//! Buffer primitives and device contracts for the wavetap audio tap engine.
//!
//! Everything backend-agnostic lives here:
//! - [`RingBuffer`] / [`MediatedBuffer`]: lossy live-capture fan-out
//! - [`StaticBuffer`] / [`StaticBufferMediator`] / [`Slice`]: loaded files
//! - [`SampleTap`]: the uniform read contract consumers program against
//! - [`Catalog`] / [`TreePath`] / [`Value`]: the hierarchical namespace
//!   backends expose to the surrounding application
//! - [`CaptureDevice`] / [`OpenConfig`]: the contracts backends implement
//!
//! Backend implementations live in `wavetap-capture` (live devices) and
//! `wavetap-files` (decoders).

pub mod error;
pub use error::{Error, Result};

mod ring;
pub use ring::RingBuffer;

mod mediator;
pub use mediator::MediatedBuffer;

mod static_buffer;
pub use static_buffer::{Slice, StaticBuffer, StaticBufferMediator};

mod tap;
pub use tap::{SampleTap, TapHandle};

mod tree;
pub use tree::{TreePath, Value};

mod catalog;
pub use catalog::{capabilities, root_children, Catalog, OpenParams, AVAILABLE, OPENED};

mod config;
pub use config::OpenConfig;

mod device;
pub use device::CaptureDevice;

pub mod frames;
