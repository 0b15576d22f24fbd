//! A compiled simulation and its tick-rate state machine.
//!
//! ```text
//!            set_frozen(true)
//!   Running ─────────────────► Frozen ◄──┐
//!      ▲                        │        │ request_step(n)
//!      └────────────────────────┘ ───────┘
//!            set_frozen(false)
//! ```
//!
//! While running, every host tick adds `tps / host_tps` to a fractional
//! progress counter and the backend is advanced by its whole part. The
//! remainder carries over, so rates above and below the host rate keep pace
//! without drift. A single host tick never advances a backend more than
//! [`MAX_ADVANCES_PER_HOST_TICK`] times; progress beyond that is dropped.
//! While frozen, queued steps are drained one per host tick.

use ns_backend::Backend;
use ns_volume::{BlockPos, ChunkedVolume, IntBounds};
use tracing::debug;

use crate::{OwnerId, SimError, SimResult, WorldId};

/// Absorbs float error so e.g. three host ticks at `1/3` still yield one advance.
const PROGRESS_EPSILON: f64 = 1e-9;

/// Upper bound on backend advances in one host tick, whatever the rate.
pub const MAX_ADVANCES_PER_HOST_TICK: u64 = 10_000;

/// Check a requested rate. Sign is checked before zero, then finiteness.
pub fn validate_tps(tps: f64) -> SimResult<()> {
    if tps < 0.0 {
        return Err(SimError::NegativeTps);
    }
    if tps == 0.0 {
        return Err(SimError::ZeroTps);
    }
    if !tps.is_finite() {
        return Err(SimError::NonFiniteTps);
    }
    Ok(())
}

/// One owner's running simulation. Owns its volume and backend exclusively.
pub struct SimInstance {
    owner: OwnerId,
    world: WorldId,
    world_bounds: IntBounds,
    backend_id: String,
    volume: ChunkedVolume,
    backend: Box<dyn Backend>,
    tps: f64,
    frozen: bool,
    pending_steps: u64,
    progress: f64,
    ticks_advanced: u64,
}

impl core::fmt::Debug for SimInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimInstance")
            .field("owner", &self.owner)
            .field("world", &self.world)
            .field("world_bounds", &self.world_bounds)
            .field("backend_id", &self.backend_id)
            .field("tps", &self.tps)
            .field("frozen", &self.frozen)
            .field("pending_steps", &self.pending_steps)
            .field("ticks_advanced", &self.ticks_advanced)
            .finish_non_exhaustive()
    }
}

impl SimInstance {
    /// A new, running instance. `world_bounds` is the region the volume was
    /// extracted from; its minimum corner anchors local coordinates.
    pub fn new(
        owner: OwnerId,
        world: WorldId,
        world_bounds: IntBounds,
        backend_id: impl Into<String>,
        volume: ChunkedVolume,
        backend: Box<dyn Backend>,
        tps: f64,
    ) -> SimResult<Self> {
        validate_tps(tps)?;
        Ok(Self {
            owner,
            world,
            world_bounds,
            backend_id: backend_id.into(),
            volume,
            backend,
            tps,
            frozen: false,
            pending_steps: 0,
            progress: 0.0,
            ticks_advanced: 0,
        })
    }

    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Region of the live world this simulation reserves.
    pub const fn world_bounds(&self) -> IntBounds {
        self.world_bounds
    }

    /// World position of the volume's local origin.
    pub const fn world_anchor(&self) -> BlockPos {
        self.world_bounds.min()
    }

    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }

    pub const fn tps(&self) -> f64 {
        self.tps
    }

    /// Change the requested rate. Does not touch the frozen flag.
    ///
    /// Permission ceilings are enforced by the caller.
    pub fn request_tps_change(&mut self, tps: f64) -> SimResult<()> {
        validate_tps(tps)?;
        self.tps = tps;
        Ok(())
    }

    /// Freezing drops partial progress; unfreezing discards queued steps.
    pub fn set_frozen(&mut self, frozen: bool) {
        if frozen == self.frozen {
            return;
        }
        self.frozen = frozen;
        if frozen {
            self.progress = 0.0;
        } else {
            self.pending_steps = 0;
        }
    }

    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Queue `ticks` backend advances, one per host tick. Frozen only.
    pub fn request_step(&mut self, ticks: i64) -> SimResult<()> {
        if !self.frozen {
            return Err(SimError::NotFrozen);
        }
        if ticks < 0 {
            return Err(SimError::NegativeStep);
        }
        if ticks == 0 {
            return Err(SimError::ZeroStep);
        }
        self.pending_steps = self.pending_steps.saturating_add(ticks as u64);
        Ok(())
    }

    pub const fn pending_steps(&self) -> u64 {
        self.pending_steps
    }

    pub const fn volume(&self) -> &ChunkedVolume {
        &self.volume
    }

    /// Backend advances performed since creation.
    pub const fn ticks_advanced(&self) -> u64 {
        self.ticks_advanced
    }

    pub fn is_valid(&self) -> bool {
        self.backend.is_valid()
    }

    /// Run one host tick at `host_tps` and return how many backend advances
    /// it performed. Stops early once the backend reports itself invalid.
    pub fn host_tick(&mut self, host_tps: f64) -> u64 {
        let due = if self.frozen {
            if self.pending_steps == 0 {
                0
            } else {
                self.pending_steps -= 1;
                1
            }
        } else {
            self.progress += self.tps / host_tps;
            let whole = (self.progress + PROGRESS_EPSILON).floor();
            if whole > MAX_ADVANCES_PER_HOST_TICK as f64 {
                debug!(owner = %self.owner, tps = self.tps, "advances capped for this host tick");
                self.progress = 0.0;
                MAX_ADVANCES_PER_HOST_TICK
            } else {
                self.progress = (self.progress - whole).max(0.0);
                whole as u64
            }
        };

        let mut advanced = 0;
        while advanced < due && self.backend.is_valid() {
            self.backend.tick(&mut self.volume);
            advanced += 1;
        }
        self.ticks_advanced += advanced;
        advanced
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use ns_backend::NullBackend;

    use super::*;

    /// Stops being valid after `budget` ticks.
    #[derive(Debug)]
    pub(crate) struct Budgeted {
        pub budget: u64,
    }

    impl Backend for Budgeted {
        fn tick(&mut self, _volume: &mut ChunkedVolume) {
            self.budget = self.budget.saturating_sub(1);
        }

        fn is_valid(&self) -> bool {
            self.budget > 0
        }
    }

    pub(crate) fn instance_with(owner: OwnerId, bounds: IntBounds, backend: Box<dyn Backend>, tps: f64) -> SimInstance {
        let volume = ChunkedVolume::new(bounds.local(), 4).unwrap();
        SimInstance::new(owner, WorldId::random(), bounds, "null", volume, backend, tps).unwrap()
    }

    fn instance(tps: f64) -> SimInstance {
        let bounds = IntBounds::from_corners(BlockPos::new(8, 60, 8), BlockPos::new(11, 63, 11)).unwrap();
        instance_with(OwnerId::random(), bounds, Box::new(NullBackend::default()), tps)
    }

    fn run(sim: &mut SimInstance, host_ticks: usize) -> u64 {
        (0..host_ticks).map(|_| sim.host_tick(20.0)).sum()
    }

    #[test]
    fn rate_validation_order() {
        assert_eq!(validate_tps(-1.0), Err(SimError::NegativeTps));
        assert_eq!(validate_tps(0.0), Err(SimError::ZeroTps));
        assert_eq!(validate_tps(-0.0), Err(SimError::ZeroTps));
        assert_eq!(validate_tps(f64::NEG_INFINITY), Err(SimError::NegativeTps));
        assert_eq!(validate_tps(f64::INFINITY), Err(SimError::NonFiniteTps));
        assert_eq!(validate_tps(f64::NAN), Err(SimError::NonFiniteTps));
        assert!(validate_tps(0.5).is_ok());
    }

    #[test]
    fn same_rate_as_host() {
        let mut sim = instance(20.0);
        assert_eq!(run(&mut sim, 100), 100);
    }

    #[test]
    fn fractional_rates_do_not_drift() {
        let mut slow = instance(20.0 / 3.0);
        assert_eq!(run(&mut slow, 300), 100);

        let mut fast = instance(50.0);
        assert_eq!(run(&mut fast, 2), 5);
        assert_eq!(run(&mut fast, 98), 245);

        let mut odd = instance(7.0);
        assert_eq!(run(&mut odd, 20), 7);
    }

    #[test]
    fn step_requires_frozen() {
        let mut sim = instance(20.0);
        assert_eq!(sim.request_step(5), Err(SimError::NotFrozen));
        assert_eq!(sim.pending_steps(), 0);

        sim.set_frozen(true);
        assert_eq!(sim.request_step(-1), Err(SimError::NegativeStep));
        assert_eq!(sim.request_step(0), Err(SimError::ZeroStep));
        assert_eq!(sim.pending_steps(), 0);
    }

    #[test]
    fn steps_drain_one_per_host_tick() {
        let mut sim = instance(1000.0);
        sim.set_frozen(true);
        assert_eq!(run(&mut sim, 10), 0);

        sim.request_step(3).unwrap();
        assert_eq!(sim.host_tick(20.0), 1);
        assert_eq!(sim.pending_steps(), 2);
        assert_eq!(run(&mut sim, 10), 2);
        assert_eq!(sim.ticks_advanced(), 3);
        assert!(sim.is_frozen());
    }

    #[test]
    fn freeze_transitions_reset_state() {
        let mut sim = instance(10.0);
        sim.host_tick(20.0);
        sim.set_frozen(true);
        sim.set_frozen(false);
        // Half a tick of progress was dropped on freeze.
        assert_eq!(sim.host_tick(20.0), 0);

        sim.set_frozen(true);
        sim.request_step(4).unwrap();
        sim.set_frozen(false);
        assert_eq!(sim.pending_steps(), 0);
    }

    #[test]
    fn tps_change_keeps_frozen_flag() {
        let mut sim = instance(20.0);
        sim.set_frozen(true);
        sim.request_tps_change(60.0).unwrap();
        assert!(sim.is_frozen());
        assert_eq!(sim.tps(), 60.0);
        assert_eq!(sim.request_tps_change(0.0), Err(SimError::ZeroTps));
        assert_eq!(sim.tps(), 60.0);
    }

    #[test]
    fn stops_advancing_invalid_backend() {
        let bounds = IntBounds::from_corners(BlockPos::ZERO, BlockPos::ZERO).unwrap();
        let mut sim = instance_with(OwnerId::random(), bounds, Box::new(Budgeted { budget: 3 }), 100.0);
        assert_eq!(sim.host_tick(20.0), 3);
        assert!(!sim.is_valid());
        assert_eq!(sim.host_tick(20.0), 0);
    }

    #[test]
    fn absurd_rates_are_capped_per_host_tick() {
        let mut sim = instance(1e30);
        assert_eq!(sim.host_tick(20.0), MAX_ADVANCES_PER_HOST_TICK);
        assert_eq!(sim.host_tick(20.0), MAX_ADVANCES_PER_HOST_TICK);
        assert_eq!(sim.ticks_advanced(), 2 * MAX_ADVANCES_PER_HOST_TICK);

        sim.request_tps_change(f64::MAX).unwrap();
        assert_eq!(sim.host_tick(20.0), MAX_ADVANCES_PER_HOST_TICK);

        // No backlog carries over once the rate drops.
        sim.request_tps_change(20.0).unwrap();
        assert_eq!(sim.host_tick(20.0), 1);
    }

    #[test]
    fn anchor_is_region_minimum() {
        let sim = instance(20.0);
        assert_eq!(sim.world_anchor(), BlockPos::new(8, 60, 8));
        assert_eq!(sim.volume().bounds().min(), BlockPos::ZERO);
    }
}
