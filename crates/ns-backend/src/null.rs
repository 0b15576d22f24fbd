use eyre::bail;
use ns_volume::ChunkedVolume;
use tracing::debug;

use crate::{Backend, BackendDescriptor, BackendInit, Capabilities};

/// Backend that leaves the volume untouched and only counts ticks.
///
/// Useful for exercising the tick scheduler without a real engine. Accepts
/// the compile flag `trace` to log every tick.
#[derive(Debug, Default)]
pub struct NullBackend {
    ticks: u64,
    trace: bool,
}

impl NullBackend {
    pub const ID: &'static str = "null";

    pub fn descriptor() -> BackendDescriptor {
        BackendDescriptor::new(Self::ID, Capabilities::COMPILE_FLAGS, Self::construct)
    }

    fn construct(init: &BackendInit<'_>) -> eyre::Result<Box<dyn Backend>> {
        let mut backend = Self::default();
        for flag in init.compile_flags() {
            match flag.as_str() {
                "trace" => backend.trace = true,
                other => bail!("Unknown compile flag '{other}' for the null backend."),
            }
        }
        Ok(Box::new(backend))
    }

    /// Ticks advanced so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Backend for NullBackend {
    fn tick(&mut self, _volume: &mut ChunkedVolume) {
        self.ticks += 1;
        if self.trace {
            debug!(tick = self.ticks, "null backend tick");
        }
    }
}
