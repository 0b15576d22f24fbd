//! Spatial and administrative gates for selections.

use ns_volume::IntBounds;

use crate::{NorestoneConfig, OwnerId, Selection, SimError, SimManager, SimResult, WorldId};

/// Pure checks consulted when a corner moves and when compiling. Holds
/// limits only, never state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionValidator {
    pub max_volume: Option<u64>,
    pub max_side: Option<i32>,
    pub reject_overlap: bool,
}

impl SelectionValidator {
    pub fn from_config(config: &NorestoneConfig) -> Self {
        Self {
            max_volume: config.max_selection_volume,
            max_side: config.max_selection_side,
            reject_overlap: config.reject_overlapping_selections,
        }
    }

    /// Check a candidate selection before committing a corner change.
    ///
    /// A selection with a single corner has no extent yet and always passes.
    pub fn validate_for_spatial_change(
        &self,
        owner: OwnerId,
        candidate: &Selection,
        sims: &SimManager,
    ) -> SimResult<()> {
        match region(candidate)? {
            Some((world, bounds)) => self.check_region(owner, world, bounds, sims),
            None => Ok(()),
        }
    }

    /// Check that a selection can be compiled, returning its world and bounds.
    pub fn validate_for_compilation(
        &self,
        owner: OwnerId,
        selection: &Selection,
        sims: &SimManager,
    ) -> SimResult<(WorldId, IntBounds)> {
        let (world, bounds) = region(selection)?.ok_or(SimError::SelectionIncomplete)?;
        self.check_region(owner, world, bounds, sims)?;
        Ok((world, bounds))
    }

    fn check_region(&self, owner: OwnerId, world: WorldId, bounds: IntBounds, sims: &SimManager) -> SimResult<()> {
        if let Some(max) = self.max_volume {
            let volume = bounds.volume();
            if volume > max {
                return Err(SimError::SelectionTooLarge { volume, max });
            }
        }

        if let Some(max) = self.max_side {
            let side = bounds.max_side();
            if side > i64::from(max) {
                return Err(SimError::SelectionTooLong { side, max });
            }
        }

        if self.reject_overlap {
            let overlaps = sims
                .reserved_regions()
                .into_iter()
                .any(|(other, other_world, other_bounds)| {
                    other != owner && other_world == world && other_bounds.intersects(&bounds)
                });
            if overlaps {
                return Err(SimError::SelectionOverlap);
            }
        }

        Ok(())
    }
}

/// The selection's world and bounds, `None` while incomplete.
fn region(selection: &Selection) -> SimResult<Option<(WorldId, IntBounds)>> {
    let Some((world, a, b)) = selection.corners() else {
        return Ok(None);
    };
    let bounds = IntBounds::from_corners(a, b).ok_or(SimError::SelectionOutOfRange)?;
    Ok(Some((world, bounds)))
}

#[cfg(test)]
mod tests {
    use ns_volume::BlockPos;

    use super::*;
    use crate::Corner;

    fn selection(world: WorldId, a: BlockPos, b: BlockPos) -> Selection {
        Selection::empty()
            .with_corner(Corner::First, a)
            .with_corner(Corner::Second, b)
            .with_world(world)
    }

    #[test]
    fn incomplete_selection_cannot_compile() {
        let validator = SelectionValidator::default();
        let sims = SimManager::new(20.0);
        let owner = OwnerId::random();

        let half = Selection::empty()
            .with_corner(Corner::First, BlockPos::ZERO)
            .with_world(WorldId::random());
        assert!(validator.validate_for_spatial_change(owner, &half, &sims).is_ok());
        assert_eq!(
            validator.validate_for_compilation(owner, &half, &sims),
            Err(SimError::SelectionIncomplete)
        );
        assert_eq!(
            validator.validate_for_compilation(owner, &Selection::empty(), &sims),
            Err(SimError::SelectionIncomplete)
        );
    }

    #[test]
    fn limits() {
        let validator = SelectionValidator {
            max_volume: Some(1000),
            max_side: Some(64),
            reject_overlap: false,
        };
        let sims = SimManager::new(20.0);
        let owner = OwnerId::random();
        let world = WorldId::random();

        let ok = selection(world, BlockPos::ZERO, BlockPos::new(9, 9, 9));
        assert!(validator.validate_for_compilation(owner, &ok, &sims).is_ok());

        let big = selection(world, BlockPos::ZERO, BlockPos::new(10, 9, 9));
        assert_eq!(
            validator.validate_for_compilation(owner, &big, &sims),
            Err(SimError::SelectionTooLarge {
                volume: 1100,
                max: 1000
            })
        );

        let long = selection(world, BlockPos::ZERO, BlockPos::new(99, 0, 0));
        assert_eq!(
            validator.validate_for_spatial_change(owner, &long, &sims),
            Err(SimError::SelectionTooLong { side: 100, max: 64 })
        );
    }

    #[test]
    fn huge_selections_hit_the_limits_instead_of_overflowing() {
        let validator = SelectionValidator {
            max_volume: Some(1_000_000),
            max_side: Some(64),
            reject_overlap: false,
        };
        let sims = SimManager::new(20.0);
        let owner = OwnerId::random();
        let world = WorldId::random();
        let far = 1_000_000_000;

        let huge = selection(world, BlockPos::new(-far, -far, -far), BlockPos::new(far, far, far));
        assert_eq!(
            validator.validate_for_spatial_change(owner, &huge, &sims),
            Err(SimError::SelectionTooLarge {
                volume: u64::MAX,
                max: 1_000_000
            })
        );

        let unlimited = SelectionValidator::default();
        let edge = selection(world, BlockPos::ZERO, BlockPos::new(i32::MAX, 0, 0));
        assert_eq!(
            unlimited.validate_for_spatial_change(owner, &edge, &sims),
            Err(SimError::SelectionOutOfRange)
        );
        assert_eq!(
            unlimited.validate_for_compilation(owner, &edge, &sims),
            Err(SimError::SelectionOutOfRange)
        );
        assert_eq!(edge.corners().map(|(w, ..)| w), Some(world));
    }
}
