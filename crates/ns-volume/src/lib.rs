//! Standalone voxel volumes compiled out of a live world.
//!
//! A [`ChunkedVolume`] holds block-state strings (`minecraft:repeater[facing=north]`)
//! in fixed-size cubic chunks that are only allocated once something non-air is
//! written into them, plus a sparse map of [`TileData`] for blocks that carry
//! structured state beyond their block state (container contents, sign text, ...).
//!
//! # Coordinates
//!
//! ```text
//!  world ──(minus bounds.min)──► volume-local ──(>> chunk_bits)──► chunk
//! ```
//!
//! Bounds are half-open: `min` is inclusive, `max` is exclusive.

mod error;
pub mod nbt;
mod pos;
mod volume;

pub use error::{VolumeError, VolumeResult};
pub use nbt::{NbtCompound, NbtValue, TagType};
pub use pos::{BlockPos, ChunkPos, IntBounds};
pub use volume::{AIR, ChunkedVolume, DEFAULT_CHUNK_BIT_SIZE, is_air};

/// Structured per-block data attached to a volume position.
pub type TileData = NbtCompound;
