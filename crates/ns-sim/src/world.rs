//! Boundary with the live world.
//!
//! The live world is owned by the host's update thread and is not safe to
//! read from anywhere else. [`HostThread`] records which thread that is so
//! world access can refuse to run elsewhere instead of racing the host.

use std::borrow::Cow;
use std::thread::{self, ThreadId};

use ns_volume::{BlockPos, ChunkPos, TileData};

use crate::{SimError, SimResult, WorldId};

/// Affinity token for the thread that owns the live world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostThread {
    id: ThreadId,
}

impl HostThread {
    /// Bind to the calling thread.
    #[must_use]
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    pub fn ensure_current(&self) -> SimResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(SimError::OffHostThread)
        }
    }
}

/// One chunk column of a live world.
pub trait WorldChunk {
    /// The world's native structured-data representation.
    type TilePayload: 'static;

    /// Block entities stored in this chunk, with their world positions.
    fn tile_entities(&self) -> impl Iterator<Item = (BlockPos, &Self::TilePayload)>;
}

/// Read access to one live world. Only call from the [`HostThread`].
pub trait LiveWorld {
    type TilePayload: 'static;
    type Chunk<'a>: WorldChunk<TilePayload = Self::TilePayload>
    where
        Self: 'a;

    /// log2 of the chunk column width.
    const CHUNK_SHIFT: u32 = 4;

    fn id(&self) -> WorldId;

    /// Block state string at `pos`, e.g. `minecraft:repeater[delay=2,facing=east]`.
    fn block_at(&self, pos: BlockPos) -> Cow<'_, str>;

    /// Load (generating if needed) the chunk column at `pos`.
    fn chunk_at(&self, pos: ChunkPos) -> Self::Chunk<'_>;

    /// Convert a native block entity payload into volume tile data.
    fn convert_tile(&self, payload: &Self::TilePayload) -> TileData;
}

/// Looks up loaded worlds by id.
pub trait WorldService {
    type World: LiveWorld;

    fn world(&self, id: WorldId) -> Option<&Self::World>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_affinity_is_per_thread() {
        let host = HostThread::current();
        assert!(host.ensure_current().is_ok());

        let off = thread::spawn(move || host.ensure_current()).join().unwrap();
        assert_eq!(off, Err(SimError::OffHostThread));
    }
}
