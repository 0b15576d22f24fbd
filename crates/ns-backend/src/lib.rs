//! Pluggable simulation backends.
//!
//! A backend is described once at startup by a [`BackendDescriptor`]: an id,
//! the set of [`Capabilities`] it wants to be initialised with, and a
//! constructor. Compiling a simulation goes through three steps:
//!
//! ```text
//! BackendInit::new(desc.capabilities())
//!     │  orchestrator branches on the flag set:
//!     ├─ AREA_REPRESENTATION → with_area_representation(&volume, bounds)
//!     └─ COMPILE_FLAGS       → with_compile_flags(flags)
//!     ▼
//! desc.finalize(init) ──► Box<dyn Backend>   (or BackendError::Fault)
//! ```
//!
//! The orchestrator never needs to know what a backend does with its inputs.

mod capability;
mod error;
mod null;
mod registry;

use ns_volume::ChunkedVolume;

pub use capability::{AreaRepresentation, BackendInit, Capabilities};
pub use error::{BackendError, BackendResult};
pub use null::NullBackend;
pub use registry::{BackendConstructor, BackendDescriptor, BackendRegistry};

/// A finalised, running simulation backend.
pub trait Backend: Send {
    /// Advance the simulation by exactly one tick.
    fn tick(&mut self, volume: &mut ChunkedVolume);

    /// Whether the backend can keep ticking. A backend that reports `false`
    /// is evicted by its owner.
    fn is_valid(&self) -> bool {
        true
    }
}
