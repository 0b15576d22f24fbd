use core::fmt;
use core::ops::{Add, Sub};

/// Integer block coordinates.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Default, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Chunk column coordinates in a live world.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

/// Axis-aligned box of block positions, `min` inclusive and `max` exclusive.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct IntBounds {
    min: BlockPos,
    max: BlockPos,
}

impl BlockPos {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub const fn with_y(self, y: i32) -> Self {
        Self { y, ..self }
    }

    /// Arithmetic shift of every component, i.e. floor division by `2^bits`.
    pub const fn shr(self, bits: u32) -> Self {
        Self {
            x: self.x >> bits,
            y: self.y >> bits,
            z: self.z >> bits,
        }
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// The chunk column containing this position for a world with
    /// `2^chunk_shift` wide chunks.
    pub const fn chunk(self, chunk_shift: u32) -> ChunkPos {
        ChunkPos {
            x: self.x >> chunk_shift,
            z: self.z >> chunk_shift,
        }
    }
}

impl fmt::Debug for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Add for BlockPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl IntBounds {
    /// Bounds spanning `[min, max)` after normalizing the two points so that
    /// `min <= max` on every axis.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds covering both corner blocks (inclusive) in either order.
    ///
    /// `None` when a corner sits on `i32::MAX` or an edge would be longer than
    /// `i32::MAX` blocks, since such bounds have no volume-local form.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Option<Self> {
        let min = a.min(b);
        let hi = a.max(b);
        let bounds = Self {
            min,
            max: BlockPos::new(hi.x.checked_add(1)?, hi.y.checked_add(1)?, hi.z.checked_add(1)?),
        };
        let max_edge = i64::from(i32::MAX);
        bounds.size().iter().all(|&edge| edge <= max_edge).then_some(bounds)
    }

    /// Inclusive minimum corner.
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    /// Exclusive maximum corner.
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// Edge lengths along each axis, as `[x, y, z]`.
    pub fn size(&self) -> [i64; 3] {
        [
            i64::from(self.max.x) - i64::from(self.min.x),
            i64::from(self.max.y) - i64::from(self.min.y),
            i64::from(self.max.z) - i64::from(self.min.z),
        ]
    }

    /// Number of block positions inside, saturating at `u64::MAX`.
    pub fn volume(&self) -> u64 {
        self.size()
            .iter()
            .try_fold(1u64, |acc, &edge| acc.checked_mul(edge as u64))
            .unwrap_or(u64::MAX)
    }

    /// Longest edge length.
    pub fn max_side(&self) -> i64 {
        self.size().into_iter().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    pub const fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.y >= self.min.y
            && pos.z >= self.min.z
            && pos.x < self.max.x
            && pos.y < self.max.y
            && pos.z < self.max.z
    }

    /// Whether the two boxes share at least one block position.
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }

    /// The same extent with its minimum corner at the origin. Edges longer
    /// than `i32::MAX` are clamped.
    #[must_use]
    pub fn local(&self) -> Self {
        let [x, y, z] = self.size().map(|edge| i32::try_from(edge).unwrap_or(i32::MAX));
        Self {
            min: BlockPos::ZERO,
            max: BlockPos::new(x, y, z),
        }
    }

    /// Every position inside, Y outermost, then Z, then X.
    pub fn iter_yzx(&self) -> impl Iterator<Item = BlockPos> + use<> {
        let Self { min, max } = *self;
        (min.y..max.y).flat_map(move |y| {
            (min.z..max.z).flat_map(move |z| (min.x..max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// Chunk columns overlapping these bounds, expanded by one chunk on the
    /// upper side.
    pub fn chunk_columns(&self, chunk_shift: u32) -> impl Iterator<Item = ChunkPos> + use<> {
        let lo = self.min.chunk(chunk_shift);
        let last = BlockPos::new(self.max.x.saturating_sub(1), 0, self.max.z.saturating_sub(1)).chunk(chunk_shift);
        let hi = ChunkPos::new(last.x + 1, last.z + 1);
        (lo.z..=hi.z).flat_map(move |z| (lo.x..=hi.x).map(move |x| ChunkPos::new(x, z)))
    }
}
