//! In-memory live world, for tests and the standalone runner.

use std::borrow::Cow;

use hashbrown::HashMap;
use ns_volume::{AIR, BlockPos, ChunkPos, NbtCompound, TileData, is_air};

use crate::{LiveWorld, WorldChunk, WorldId, WorldService};

/// A sparse world where unset blocks are air.
#[derive(Debug, Clone)]
pub struct MemoryWorld {
    id: WorldId,
    blocks: HashMap<BlockPos, String>,
    tiles: HashMap<ChunkPos, Vec<(BlockPos, NbtCompound)>>,
}

impl MemoryWorld {
    #[must_use]
    pub fn new(id: WorldId) -> Self {
        Self {
            id,
            blocks: HashMap::new(),
            tiles: HashMap::new(),
        }
    }

    pub fn set_block(&mut self, pos: BlockPos, state: impl Into<String>) {
        let state = state.into();
        if is_air(&state) {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, state);
        }
    }

    /// Attach a block entity, replacing any already at `pos`.
    pub fn set_tile(&mut self, pos: BlockPos, data: NbtCompound) {
        let entries = self.tiles.entry(pos.chunk(<Self as LiveWorld>::CHUNK_SHIFT)).or_default();
        entries.retain(|(p, _)| *p != pos);
        entries.push((pos, data));
    }

    /// Number of non-air blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Borrowed view of one chunk column of a [`MemoryWorld`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryChunk<'a> {
    entries: &'a [(BlockPos, NbtCompound)],
}

impl WorldChunk for MemoryChunk<'_> {
    type TilePayload = NbtCompound;

    fn tile_entities(&self) -> impl Iterator<Item = (BlockPos, &NbtCompound)> {
        self.entries.iter().map(|(pos, data)| (*pos, data))
    }
}

impl LiveWorld for MemoryWorld {
    type TilePayload = NbtCompound;
    type Chunk<'a> = MemoryChunk<'a>;

    fn id(&self) -> WorldId {
        self.id
    }

    fn block_at(&self, pos: BlockPos) -> Cow<'_, str> {
        Cow::Borrowed(self.blocks.get(&pos).map_or(AIR, String::as_str))
    }

    fn chunk_at(&self, pos: ChunkPos) -> MemoryChunk<'_> {
        MemoryChunk {
            entries: self.tiles.get(&pos).map(Vec::as_slice).unwrap_or_default(),
        }
    }

    fn convert_tile(&self, payload: &NbtCompound) -> TileData {
        payload.clone()
    }
}

impl WorldService for MemoryWorld {
    type World = Self;

    fn world(&self, id: WorldId) -> Option<&Self> {
        (id == self.id).then_some(self)
    }
}

/// Several memory worlds, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorlds {
    worlds: HashMap<WorldId, MemoryWorld>,
}

impl MemoryWorlds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, world: MemoryWorld) {
        self.worlds.insert(world.id, world);
    }

    pub fn get_mut(&mut self, id: WorldId) -> Option<&mut MemoryWorld> {
        self.worlds.get_mut(&id)
    }
}

impl WorldService for MemoryWorlds {
    type World = MemoryWorld;

    fn world(&self, id: WorldId) -> Option<&MemoryWorld> {
        self.worlds.get(&id)
    }
}
