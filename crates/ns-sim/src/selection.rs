//! Per-owner selections and sessions.

use hashbrown::HashMap;
use ns_volume::{BlockPos, IntBounds};

use crate::{OwnerId, WorldId};

/// Which of the two selection corners to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    First,
    Second,
}

impl Corner {
    /// `0` and `1` map to the first and second corner.
    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::First),
            1 => Some(Self::Second),
            _ => None,
        }
    }
}

/// A region being selected: up to two corners in one world.
///
/// Corners are inclusive and may be given in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pos1: Option<BlockPos>,
    pos2: Option<BlockPos>,
    world: Option<WorldId>,
}

impl Selection {
    pub const fn empty() -> Self {
        Self {
            pos1: None,
            pos2: None,
            world: None,
        }
    }

    pub const fn corner(&self, corner: Corner) -> Option<BlockPos> {
        match corner {
            Corner::First => self.pos1,
            Corner::Second => self.pos2,
        }
    }

    pub const fn world(&self) -> Option<WorldId> {
        self.world
    }

    #[must_use]
    pub const fn with_corner(self, corner: Corner, pos: BlockPos) -> Self {
        match corner {
            Corner::First => Self {
                pos1: Some(pos),
                ..self
            },
            Corner::Second => Self {
                pos2: Some(pos),
                ..self
            },
        }
    }

    #[must_use]
    pub const fn with_world(self, world: WorldId) -> Self {
        Self {
            world: Some(world),
            ..self
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.pos1.is_none() && self.pos2.is_none()
    }

    /// World and both corners, once all three are known.
    pub const fn corners(&self) -> Option<(WorldId, BlockPos, BlockPos)> {
        match (self.world, self.pos1, self.pos2) {
            (Some(world), Some(a), Some(b)) => Some((world, a, b)),
            _ => None,
        }
    }

    /// World and block bounds, once complete. `None` as well when the
    /// corners span more than the coordinate range allows.
    pub fn resolved(&self) -> Option<(WorldId, IntBounds)> {
        let (world, a, b) = self.corners()?;
        IntBounds::from_corners(a, b).map(|bounds| (world, bounds))
    }

    pub fn bounds(&self) -> Option<IntBounds> {
        self.resolved().map(|(_, bounds)| bounds)
    }
}

/// An item kind used as the selection tool, e.g. `minecraft:wooden_hoe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolItem(pub String);

impl ToolItem {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Empty hand.
    pub fn is_air(&self) -> bool {
        self.0.is_empty() || ns_volume::is_air(&self.0)
    }
}

/// State kept for an owner between operations.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub selection: Selection,
    pub selection_tool: Option<ToolItem>,
}

/// In-memory sessions keyed by owner. Sessions are created on first use.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<OwnerId, Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: OwnerId) -> Option<&Session> {
        self.sessions.get(&owner)
    }

    pub fn get_or_create(&mut self, owner: OwnerId) -> &mut Session {
        self.sessions.entry(owner).or_default()
    }

    /// The owner's selection, empty when they have no session yet.
    pub fn selection(&self, owner: OwnerId) -> Selection {
        self.get(owner).map(|s| s.selection).unwrap_or_default()
    }

    /// Drop an owner's session, e.g. when they disconnect.
    pub fn end(&mut self, owner: OwnerId) -> Option<Session> {
        self.sessions.remove(&owner)
    }
}
