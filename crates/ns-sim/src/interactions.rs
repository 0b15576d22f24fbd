//! Owner-facing operations.
//!
//! Every mutating operation checks its permission node first and fails
//! without touching state when the node is missing.

use std::time::{Duration, Instant};

use ns_backend::{BackendRegistry, Capabilities};
use ns_volume::BlockPos;
use tracing::info;

use crate::perms::{self, Permissions};
use crate::{
    Actor, Corner, HostThread, LiveWorld, NorestoneConfig, OwnerId, Selection, SelectionValidator, SessionStore,
    SimError, SimInstance, SimManager, SimResult, ToolItem, WorldService, extract_region,
};

/// Selections, compilation and running simulations for every owner.
///
/// Bound to the thread it was created on; that thread must own the live world.
pub struct Norestone<P: Permissions> {
    config: NorestoneConfig,
    backends: BackendRegistry,
    permissions: P,
    sessions: SessionStore,
    validator: SelectionValidator,
    sims: SimManager,
    host: HostThread,
}

impl<P: Permissions> core::fmt::Debug for Norestone<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Norestone")
            .field("config", &self.config)
            .field("backends", &self.backends)
            .field("sims", &self.sims)
            .finish_non_exhaustive()
    }
}

impl<P: Permissions> Norestone<P> {
    pub fn new(config: NorestoneConfig, backends: BackendRegistry, permissions: P) -> Self {
        let validator = SelectionValidator::from_config(&config);
        let sims = SimManager::new(config.host_tps);
        Self {
            config,
            backends,
            permissions,
            sessions: SessionStore::new(),
            validator,
            sims,
            host: HostThread::current(),
        }
    }

    fn require(&self, owner: OwnerId, node: &'static str) -> SimResult<()> {
        if self.permissions.has_permission(owner, node) {
            Ok(())
        } else {
            Err(SimError::PermissionDenied(node))
        }
    }

    /// Move one corner of the actor's selection to `pos` in their current world.
    ///
    /// Returns `Ok(false)` when the corner is already there.
    pub fn set_sim_sel_corner(&mut self, actor: Actor, pos: BlockPos, corner: Corner) -> SimResult<bool> {
        self.require(actor.id, perms::SELECT)?;

        let current = self.sessions.selection(actor.id);
        if current.world().is_some_and(|world| world != actor.world) {
            return Err(SimError::CrossWorld);
        }
        if current.corner(corner) == Some(pos) {
            return Ok(false);
        }

        let candidate = current.with_corner(corner, pos).with_world(actor.world);
        self.validator
            .validate_for_spatial_change(actor.id, &candidate, &self.sims)?;

        self.sessions.get_or_create(actor.id).selection = candidate;
        Ok(true)
    }

    /// Forget both corners and the world.
    pub fn desel(&mut self, owner: OwnerId) -> SimResult<()> {
        self.require(owner, perms::SELECT)?;
        self.sessions.get_or_create(owner).selection = Selection::empty();
        Ok(())
    }

    pub fn bind_sim_sel_wand(&mut self, owner: OwnerId, tool: ToolItem) -> SimResult<()> {
        self.require(owner, perms::CHANGE_SEL_WAND)?;
        if tool.is_air() {
            return Err(SimError::EmptySelectionTool);
        }
        self.sessions.get_or_create(owner).selection_tool = Some(tool);
        Ok(())
    }

    /// Whether `item` is the owner's bound selection tool.
    pub fn is_sel_wand(&self, owner: OwnerId, item: &ToolItem) -> bool {
        self.sessions
            .get(owner)
            .and_then(|s| s.selection_tool.as_ref())
            .is_some_and(|tool| tool == item)
    }

    pub fn selection(&self, owner: OwnerId) -> Selection {
        self.sessions.selection(owner)
    }

    /// Compile the owner's selection with backend `backend_id` and queue the
    /// result for admission.
    ///
    /// Blocks the host thread while the region is scanned. The returned
    /// duration covers extraction and backend finalisation.
    pub fn compile_sim<W: WorldService>(
        &mut self,
        owner: OwnerId,
        worlds: &W,
        backend_id: &str,
        flags: Vec<String>,
    ) -> SimResult<Duration> {
        self.require(owner, perms::COMPILE)?;
        if self.sims.has_sim(owner) {
            return Err(SimError::SimStillActive);
        }
        let selection = self.sessions.selection(owner);
        let (world_id, bounds) = self
            .validator
            .validate_for_compilation(owner, &selection, &self.sims)?;
        let descriptor = self
            .backends
            .get(backend_id)
            .ok_or_else(|| SimError::UnknownBackend(backend_id.to_string()))?;
        self.host.ensure_current()?;

        let start = Instant::now();
        let world = worlds.world(world_id).ok_or(SimError::WorldUnavailable)?;
        let volume = extract_region(&self.host, world, bounds, self.config.chunk_bit_size)?;

        let capabilities = descriptor.capabilities();
        let backend = {
            let mut init = descriptor.initializer();
            if capabilities.contains(Capabilities::AREA_REPRESENTATION) {
                init.with_area_representation(&volume, volume.bounds());
            }
            if capabilities.contains(Capabilities::COMPILE_FLAGS) {
                init.with_compile_flags(flags);
            }
            descriptor.finalize(init)?
        };
        let took = start.elapsed();

        let blocks = volume.populated_count();
        let tiles = volume.tile_count();
        let sim = SimInstance::new(
            owner,
            world.id(),
            bounds,
            descriptor.id(),
            volume,
            backend,
            self.config.default_sim_tps,
        )?;
        self.sims.request_sim_add(sim)?;
        self.sessions.get_or_create(owner).selection = Selection::empty();

        info!(
            %owner,
            backend = backend_id,
            ?bounds,
            blocks,
            tiles,
            took_ms = took.as_secs_f64() * 1000.0,
            "compiled simulation"
        );
        Ok(took)
    }

    /// Change the owner's simulation rate, subject to their TPS ceiling.
    pub fn change_sim_tps(&mut self, owner: OwnerId, tps: f64) -> SimResult<()> {
        self.require(owner, perms::CHANGE_TPS)?;
        let sim = self.sims.owner_sim_mut(owner).ok_or(SimError::NoSimulation)?;
        crate::validate_tps(tps)?;
        if !self.permissions.has_permission(owner, perms::MAX_TPS_BYPASS) {
            let max = self.config.max_tps_for(owner, &self.permissions);
            if tps > max {
                return Err(SimError::TpsAboveMax(max));
            }
        }
        sim.request_tps_change(tps)
    }

    pub fn set_sim_frozen(&mut self, owner: OwnerId, frozen: bool) -> SimResult<()> {
        self.require(owner, perms::FREEZE)?;
        let sim = self.sims.owner_sim_mut(owner).ok_or(SimError::NoSimulation)?;
        sim.set_frozen(frozen);
        Ok(())
    }

    /// Queue `ticks` single-step advances on a frozen simulation.
    pub fn tick_step(&mut self, owner: OwnerId, ticks: i64) -> SimResult<()> {
        self.require(owner, perms::STEP)?;
        let sim = self.sims.owner_sim_mut(owner).ok_or(SimError::NoSimulation)?;
        sim.request_step(ticks)
    }

    /// Remove the owner's simulation at the next safe point.
    pub fn clear_sim(&mut self, owner: OwnerId) -> SimResult<()> {
        self.require(owner, perms::CLEAR)?;
        if self.sims.request_sim_remove(owner) {
            Ok(())
        } else {
            Err(SimError::NoSimulation)
        }
    }

    /// The owner's TPS ceiling, `None` when they may bypass it.
    pub fn max_sim_tps(&self, owner: OwnerId) -> Option<f64> {
        if self.permissions.has_permission(owner, perms::MAX_TPS_BYPASS) {
            None
        } else {
            Some(self.config.max_tps_for(owner, &self.permissions))
        }
    }

    /// Drop everything kept for a departing owner except their simulation.
    pub fn end_session(&mut self, owner: OwnerId) {
        self.sessions.end(owner);
    }

    /// One host tick. Call at `config().host_tps`.
    pub fn tick(&mut self) -> u64 {
        self.sims.tick()
    }

    pub const fn config(&self) -> &NorestoneConfig {
        &self.config
    }

    pub const fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub const fn sims(&self) -> &SimManager {
        &self.sims
    }

    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub const fn host(&self) -> HostThread {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use ns_backend::NullBackend;

    use super::*;
    use crate::WorldId;
    use crate::memory::MemoryWorld;
    use crate::perms::AllowAll;

    fn setup() -> (Norestone<AllowAll>, MemoryWorld, Actor) {
        let world = MemoryWorld::new(WorldId::random());
        let actor = Actor::new(OwnerId::random(), world.id());
        let ns = Norestone::new(NorestoneConfig::default(), BackendRegistry::with_builtin(), AllowAll);
        (ns, world, actor)
    }

    #[test]
    fn corner_reports_change() {
        let (mut ns, _, actor) = setup();
        assert_eq!(ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::First), Ok(true));
        assert_eq!(ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::First), Ok(false));
        assert_eq!(ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::Second), Ok(true));
    }

    #[test]
    fn compile_clears_selection_and_queues_sim() {
        let (mut ns, world, actor) = setup();
        ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::First).unwrap();
        ns.set_sim_sel_corner(actor, BlockPos::new(2, 2, 2), Corner::Second).unwrap();

        ns.compile_sim(actor.id, &world, NullBackend::ID, vec![]).unwrap();
        assert!(ns.selection(actor.id).is_empty());
        assert!(ns.sims().has_sim(actor.id));

        ns.tick();
        let sim = ns.sims().owner_sim(actor.id).unwrap();
        assert_eq!(sim.tps(), 20.0);
        assert_eq!(sim.ticks_advanced(), 1);
    }

    #[test]
    fn bad_compile_flag_is_a_backend_fault() {
        let (mut ns, world, actor) = setup();
        ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::First).unwrap();
        ns.set_sim_sel_corner(actor, BlockPos::ZERO, Corner::Second).unwrap();

        let err = ns
            .compile_sim(actor.id, &world, NullBackend::ID, vec!["warp".into()])
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::BackendFault);
        assert!(!ns.sims().has_sim(actor.id));
        assert!(!ns.selection(actor.id).is_empty());
    }

    #[test]
    fn wand_binding() {
        let (mut ns, _, actor) = setup();
        assert_eq!(
            ns.bind_sim_sel_wand(actor.id, ToolItem::new("minecraft:air")),
            Err(SimError::EmptySelectionTool)
        );
        ns.bind_sim_sel_wand(actor.id, ToolItem::new("minecraft:blaze_rod"))
            .unwrap();
        assert!(ns.is_sel_wand(actor.id, &ToolItem::new("minecraft:blaze_rod")));
        assert!(!ns.is_sel_wand(actor.id, &ToolItem::new("minecraft:stick")));
    }
}
