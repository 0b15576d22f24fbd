//! Volume error types.

use thiserror::Error;

use crate::{BlockPos, IntBounds};

/// Volume error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VolumeError {
    /// Write outside of the volume's fixed bounds.
    #[error("position {pos:?} is outside of the volume bounds {bounds:?}")]
    OutOfBounds { pos: BlockPos, bounds: IntBounds },

    /// Chunk edge would be degenerate or absurdly large.
    #[error("chunk bit size {0} is not in 1..=8")]
    InvalidChunkBitSize(u8),

    /// More distinct block states than a palette index can address.
    #[error("block state palette is full ({0} entries)")]
    PaletteFull(usize),
}

/// Result type for volume operations.
pub type VolumeResult<T> = Result<T, VolumeError>;
