//! Copy a region of the live world into a standalone volume.

use ns_volume::{ChunkedVolume, IntBounds, is_air};
use tracing::debug;

use crate::{HostThread, LiveWorld, SimResult, WorldChunk};

/// Extract `bounds` (world coordinates) from `world` into a new volume whose
/// minimum corner is the local origin.
///
/// Block states come from per-position reads in Y, Z, X order, skipping air.
/// Tile data comes from walking the chunk columns covering the region, since
/// block entities are only reachable through their chunk; entries outside the
/// region are ignored.
///
/// Must run on the host thread and blocks it for the whole scan.
pub fn extract_region<W: LiveWorld>(
    host: &HostThread,
    world: &W,
    bounds: IntBounds,
    chunk_bit_size: u8,
) -> SimResult<ChunkedVolume> {
    host.ensure_current()?;

    let origin = bounds.min();
    let mut volume = ChunkedVolume::new(bounds.local(), chunk_bit_size)?;

    for world_pos in bounds.iter_yzx() {
        let state = world.block_at(world_pos);
        if is_air(&state) {
            continue;
        }
        volume.set_block_state(world_pos - origin, &state)?;
    }

    let mut columns = 0usize;
    for column in bounds.chunk_columns(W::CHUNK_SHIFT) {
        columns += 1;
        let chunk = world.chunk_at(column);
        for (world_pos, payload) in chunk.tile_entities() {
            if !bounds.contains(world_pos) {
                continue;
            }
            volume.set_tile_data(world_pos - origin, world.convert_tile(payload))?;
        }
    }

    debug!(
        world = %world.id(),
        ?bounds,
        blocks = volume.populated_count(),
        tiles = volume.tile_count(),
        chunk_columns = columns,
        "extracted region"
    );

    Ok(volume)
}
