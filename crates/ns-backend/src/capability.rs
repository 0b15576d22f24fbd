//! Initialisation capabilities and the builder that carries them.

use bitflags::bitflags;
use ns_volume::{ChunkedVolume, IntBounds};

bitflags! {
    /// Inputs a backend asks for before it can be finalised.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Consumes the compiled volume and its bounds.
        const AREA_REPRESENTATION = 1 << 0;
        /// Consumes the free-form compile flag list.
        const COMPILE_FLAGS = 1 << 1;
    }
}

/// The compiled area handed to backends that request it.
#[derive(Debug, Clone, Copy)]
pub struct AreaRepresentation<'a> {
    pub volume: &'a ChunkedVolume,
    /// Volume-local bounds, minimum corner at the origin.
    pub bounds: IntBounds,
}

/// Accumulates the inputs for one backend under construction.
///
/// Inputs for capabilities the backend did not request are ignored, so a
/// backend only ever sees what it declared.
#[derive(Debug)]
pub struct BackendInit<'a> {
    requested: Capabilities,
    area: Option<AreaRepresentation<'a>>,
    compile_flags: Option<Vec<String>>,
}

impl<'a> BackendInit<'a> {
    #[must_use]
    pub const fn new(requested: Capabilities) -> Self {
        Self {
            requested,
            area: None,
            compile_flags: None,
        }
    }

    pub const fn requested(&self) -> Capabilities {
        self.requested
    }

    pub fn with_area_representation(&mut self, volume: &'a ChunkedVolume, bounds: IntBounds) -> &mut Self {
        if self.requested.contains(Capabilities::AREA_REPRESENTATION) {
            self.area = Some(AreaRepresentation { volume, bounds });
        }
        self
    }

    pub fn with_compile_flags(&mut self, flags: Vec<String>) -> &mut Self {
        if self.requested.contains(Capabilities::COMPILE_FLAGS) {
            self.compile_flags = Some(flags);
        }
        self
    }

    /// Capabilities that have been supplied so far.
    pub fn supplied(&self) -> Capabilities {
        let mut supplied = Capabilities::empty();
        supplied.set(Capabilities::AREA_REPRESENTATION, self.area.is_some());
        supplied.set(Capabilities::COMPILE_FLAGS, self.compile_flags.is_some());
        supplied
    }

    /// Requested capabilities that are still missing.
    pub fn missing(&self) -> Capabilities {
        self.requested - self.supplied()
    }

    pub const fn area(&self) -> Option<&AreaRepresentation<'a>> {
        self.area.as_ref()
    }

    /// The compile flags, empty when none were supplied.
    pub fn compile_flags(&self) -> &[String] {
        self.compile_flags.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use ns_volume::BlockPos;

    use super::*;

    fn volume() -> ChunkedVolume {
        let bounds = IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(1, 1, 1)).unwrap();
        ChunkedVolume::new(bounds, 4).unwrap()
    }

    #[test]
    fn only_requested_inputs_are_kept() {
        let vol = volume();
        let mut init = BackendInit::new(Capabilities::COMPILE_FLAGS);
        init.with_area_representation(&vol, vol.bounds())
            .with_compile_flags(vec!["fast".into()]);

        assert!(init.area().is_none());
        assert_eq!(init.compile_flags(), ["fast"]);
        assert!(init.missing().is_empty());
    }

    #[test]
    fn missing_reports_unsupplied() {
        let vol = volume();
        let mut init = BackendInit::new(Capabilities::all());
        assert_eq!(init.missing(), Capabilities::all());

        init.with_area_representation(&vol, vol.bounds());
        assert_eq!(init.missing(), Capabilities::COMPILE_FLAGS);
        assert_eq!(init.area().map(|a| a.bounds), Some(vol.bounds()));
    }

    #[test]
    fn no_capabilities_is_immediately_complete() {
        let init = BackendInit::new(Capabilities::empty());
        assert!(init.missing().is_empty());
        assert!(init.compile_flags().is_empty());
    }
}
