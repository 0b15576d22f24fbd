//! Sparse chunked block storage.

use hashbrown::HashMap;

use crate::{BlockPos, IntBounds, TileData, VolumeError, VolumeResult};

/// Block state every unpopulated position reads as.
pub const AIR: &str = "minecraft:air";

/// Chunk edge of `2^4 = 16` blocks, matching the game's own sections.
pub const DEFAULT_CHUNK_BIT_SIZE: u8 = 4;

/// Palette index reserved for air.
const AIR_ID: u16 = 0;

/// Whether a block state string denotes one of the air blocks.
pub fn is_air(state: &str) -> bool {
    let name = state.split_once('[').map_or(state, |(name, _)| name);
    let name = name.strip_prefix("minecraft:").unwrap_or(name);
    matches!(name, "air" | "cave_air" | "void_air")
}

/// Chunk coordinates inside a volume (volume-local position >> chunk bits).
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
struct VolumeChunkPos {
    x: i32,
    y: i32,
    z: i32,
}

struct VolumeChunk {
    /// Palette ids, indexed `x | z << bits | y << 2*bits`.
    blocks: Box<[u16]>,
    /// Populated (non-air) entries in `blocks`.
    non_air: u32,
}

impl VolumeChunk {
    fn new(bits: u8) -> Self {
        let len = 1usize << (3 * u32::from(bits));
        Self {
            blocks: vec![AIR_ID; len].into_boxed_slice(),
            non_air: 0,
        }
    }

    fn set(&mut self, index: usize, id: u16) {
        let old = core::mem::replace(&mut self.blocks[index], id);
        match (old == AIR_ID, id == AIR_ID) {
            (true, false) => self.non_air += 1,
            (false, true) => self.non_air -= 1,
            _ => {}
        }
    }
}

/// A standalone voxel volume with fixed bounds.
///
/// Chunks are allocated on the first non-air write and dropped again when
/// their last block is cleared; the partitioning never changes what reads
/// return.
pub struct ChunkedVolume {
    bounds: IntBounds,
    chunk_bits: u8,
    /// Distinct block states, `palette[0]` is always [`AIR`].
    palette: Vec<String>,
    palette_index: HashMap<String, u16>,
    chunks: HashMap<VolumeChunkPos, VolumeChunk>,
    tile_data: HashMap<BlockPos, TileData>,
}

impl ChunkedVolume {
    /// Create an empty volume. `chunk_bits` must be in `1..=8`.
    pub fn new(bounds: IntBounds, chunk_bits: u8) -> VolumeResult<Self> {
        if !(1..=8).contains(&chunk_bits) {
            return Err(VolumeError::InvalidChunkBitSize(chunk_bits));
        }

        let mut palette_index = HashMap::new();
        palette_index.insert(AIR.to_string(), AIR_ID);

        Ok(Self {
            bounds,
            chunk_bits,
            palette: vec![AIR.to_string()],
            palette_index,
            chunks: HashMap::new(),
            tile_data: HashMap::new(),
        })
    }

    pub const fn bounds(&self) -> IntBounds {
        self.bounds
    }

    pub const fn chunk_bit_size(&self) -> u8 {
        self.chunk_bits
    }

    /// Chunk edge length in blocks.
    pub const fn chunk_edge(&self) -> i32 {
        1 << self.chunk_bits
    }

    fn locate(&self, pos: BlockPos) -> (VolumeChunkPos, usize) {
        let local = pos - self.bounds.min();
        let bits = u32::from(self.chunk_bits);
        let chunk = local.shr(bits);
        let mask = (1 << bits) - 1;
        let index = (local.x & mask) | ((local.z & mask) << bits) | ((local.y & mask) << (2 * bits));
        (
            VolumeChunkPos {
                x: chunk.x,
                y: chunk.y,
                z: chunk.z,
            },
            index as usize,
        )
    }

    fn check_bounds(&self, pos: BlockPos) -> VolumeResult<()> {
        if self.bounds.contains(pos) {
            Ok(())
        } else {
            Err(VolumeError::OutOfBounds {
                pos,
                bounds: self.bounds,
            })
        }
    }

    fn palette_id(&mut self, state: &str) -> VolumeResult<u16> {
        if let Some(&id) = self.palette_index.get(state) {
            return Ok(id);
        }
        let id = u16::try_from(self.palette.len())
            .map_err(|_| VolumeError::PaletteFull(self.palette.len()))?;
        self.palette.push(state.to_string());
        self.palette_index.insert(state.to_string(), id);
        Ok(id)
    }

    /// Write a block state. Any air variant clears the position.
    pub fn set_block_state(&mut self, pos: BlockPos, state: &str) -> VolumeResult<()> {
        self.check_bounds(pos)?;
        let (chunk_pos, index) = self.locate(pos);

        if is_air(state) {
            if let Some(chunk) = self.chunks.get_mut(&chunk_pos) {
                chunk.set(index, AIR_ID);
                if chunk.non_air == 0 {
                    self.chunks.remove(&chunk_pos);
                }
            }
            return Ok(());
        }

        let id = self.palette_id(state)?;
        let bits = self.chunk_bits;
        self.chunks
            .entry(chunk_pos)
            .or_insert_with(|| VolumeChunk::new(bits))
            .set(index, id);
        Ok(())
    }

    /// Block state at `pos`; [`AIR`] for unpopulated positions, `None` outside
    /// the bounds.
    pub fn block_state(&self, pos: BlockPos) -> Option<&str> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let (chunk_pos, index) = self.locate(pos);
        let id = self
            .chunks
            .get(&chunk_pos)
            .map_or(AIR_ID, |chunk| chunk.blocks[index]);
        Some(self.palette[id as usize].as_str())
    }

    /// Whether a non-air block is stored at `pos`.
    pub fn is_populated(&self, pos: BlockPos) -> bool {
        self.block_state(pos).is_some_and(|state| !is_air(state))
    }

    /// Number of non-air positions.
    pub fn populated_count(&self) -> usize {
        self.chunks.values().map(|c| c.non_air as usize).sum()
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Distinct block states seen so far, air first.
    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    /// All non-air blocks, in no particular order.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockPos, &str)> {
        let bits = u32::from(self.chunk_bits);
        let mask = (1i32 << bits) - 1;
        let origin = self.bounds.min();
        self.chunks.iter().flat_map(move |(cpos, chunk)| {
            chunk
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, id)| **id != AIR_ID)
                .map(move |(index, id)| {
                    let index = index as i32;
                    let local = BlockPos::new(
                        (cpos.x << bits) | (index & mask),
                        (cpos.y << bits) | ((index >> (2 * bits)) & mask),
                        (cpos.z << bits) | ((index >> bits) & mask),
                    );
                    (local + origin, self.palette[*id as usize].as_str())
                })
        })
    }

    /// Attach tile data to `pos`, returning what was there before.
    pub fn set_tile_data(&mut self, pos: BlockPos, data: TileData) -> VolumeResult<Option<TileData>> {
        self.check_bounds(pos)?;
        Ok(self.tile_data.insert(pos, data))
    }

    pub fn tile_data(&self, pos: BlockPos) -> Option<&TileData> {
        self.tile_data.get(&pos)
    }

    pub fn tile_data_mut(&mut self, pos: BlockPos) -> Option<&mut TileData> {
        self.tile_data.get_mut(&pos)
    }

    pub fn remove_tile_data(&mut self, pos: BlockPos) -> Option<TileData> {
        self.tile_data.remove(&pos)
    }

    /// Number of positions carrying tile data.
    pub fn tile_count(&self) -> usize {
        self.tile_data.len()
    }

    pub fn iter_tile_data(&self) -> impl Iterator<Item = (BlockPos, &TileData)> {
        self.tile_data.iter().map(|(pos, data)| (*pos, data))
    }
}

impl core::fmt::Debug for ChunkedVolume {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChunkedVolume")
            .field("bounds", &self.bounds)
            .field("chunk_bits", &self.chunk_bits)
            .field("chunks", &self.chunks.len())
            .field("palette", &self.palette.len())
            .field("tile_data", &self.tile_data.len())
            .finish()
    }
}
