//! Registry of live simulations with deferred admission.
//!
//! Adds and removes are queued and only applied at the start of
//! [`SimManager::tick`], so a host tick always sees the same set of
//! simulations from start to end.

use std::collections::VecDeque;

use hashbrown::HashMap;
use ns_volume::IntBounds;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{OwnerId, SimError, SimInstance, SimResult, WorldId};

enum SimRequest {
    Add(Box<SimInstance>),
    Remove(OwnerId),
}

/// At most one [`SimInstance`] per owner.
pub struct SimManager {
    host_tps: f64,
    sims: HashMap<OwnerId, SimInstance>,
    requests: Mutex<VecDeque<SimRequest>>,
    host_ticks: u64,
}

impl core::fmt::Debug for SimManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimManager")
            .field("host_tps", &self.host_tps)
            .field("sims", &self.sims.len())
            .field("pending_requests", &self.requests.lock().len())
            .field("host_ticks", &self.host_ticks)
            .finish()
    }
}

impl SimManager {
    #[must_use]
    pub fn new(host_tps: f64) -> Self {
        Self {
            host_tps,
            sims: HashMap::new(),
            requests: Mutex::new(VecDeque::new()),
            host_ticks: 0,
        }
    }

    pub const fn host_tps(&self) -> f64 {
        self.host_tps
    }

    /// Host ticks run so far.
    pub const fn host_ticks(&self) -> u64 {
        self.host_ticks
    }

    /// Queue `sim` for admission at the next safe point.
    ///
    /// Rejected when its owner already has a simulation, live or queued.
    pub fn request_sim_add(&self, sim: SimInstance) -> SimResult<()> {
        let mut requests = self.requests.lock();
        if self.has_sim_with(&requests, sim.owner()) {
            return Err(SimError::SimStillActive);
        }
        requests.push_back(SimRequest::Add(Box::new(sim)));
        Ok(())
    }

    /// Queue removal of `owner`'s simulation. Returns `false` when there is
    /// nothing to remove.
    pub fn request_sim_remove(&self, owner: OwnerId) -> bool {
        let mut requests = self.requests.lock();
        if !self.has_sim_with(&requests, owner) {
            return false;
        }
        requests.push_back(SimRequest::Remove(owner));
        true
    }

    /// Whether `owner` will have a simulation once queued requests apply.
    pub fn has_sim(&self, owner: OwnerId) -> bool {
        self.has_sim_with(&self.requests.lock(), owner)
    }

    fn has_sim_with(&self, requests: &VecDeque<SimRequest>, owner: OwnerId) -> bool {
        requests.iter().fold(self.sims.contains_key(&owner), |present, req| match req {
            SimRequest::Add(sim) if sim.owner() == owner => true,
            SimRequest::Remove(o) if *o == owner => false,
            _ => present,
        })
    }

    /// The owner's live simulation. Queued admissions are not visible yet.
    pub fn owner_sim(&self, owner: OwnerId) -> Option<&SimInstance> {
        self.sims.get(&owner)
    }

    pub fn owner_sim_mut(&mut self, owner: OwnerId) -> Option<&mut SimInstance> {
        self.sims.get_mut(&owner)
    }

    /// Regions held by live simulations and by queued admissions.
    pub fn reserved_regions(&self) -> Vec<(OwnerId, WorldId, IntBounds)> {
        let requests = self.requests.lock();
        let queued = requests.iter().filter_map(|req| match req {
            SimRequest::Add(sim) => Some(&**sim),
            SimRequest::Remove(_) => None,
        });
        self.sims
            .values()
            .chain(queued)
            .map(|sim| (sim.owner(), sim.world(), sim.world_bounds()))
            .collect()
    }

    /// Number of live simulations.
    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }

    /// Run one host tick: apply queued requests, advance every simulation,
    /// then evict those whose backend became invalid.
    ///
    /// Returns the total number of backend advances.
    pub fn tick(&mut self) -> u64 {
        self.apply_requests();

        let host_tps = self.host_tps;
        let advanced = self.sims.values_mut().map(|sim| sim.host_tick(host_tps)).sum();

        self.sims.retain(|owner, sim| {
            let keep = sim.is_valid();
            if !keep {
                warn!(%owner, backend = sim.backend_id(), "evicting simulation with invalid backend");
            }
            keep
        });

        self.host_ticks += 1;
        advanced
    }

    fn apply_requests(&mut self) {
        let requests: Vec<_> = self.requests.get_mut().drain(..).collect();
        for request in requests {
            match request {
                SimRequest::Add(sim) => {
                    let owner = sim.owner();
                    info!(
                        %owner,
                        backend = sim.backend_id(),
                        bounds = ?sim.world_bounds(),
                        "simulation started"
                    );
                    self.sims.insert(owner, *sim);
                }
                SimRequest::Remove(owner) => {
                    if self.sims.remove(&owner).is_some() {
                        info!(%owner, "simulation cleared");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ns_backend::NullBackend;
    use ns_volume::BlockPos;

    use super::*;
    use crate::sim::tests::{Budgeted, instance_with};

    fn bounds() -> IntBounds {
        IntBounds::from_corners(BlockPos::ZERO, BlockPos::new(3, 3, 3)).unwrap()
    }

    fn null_sim(owner: OwnerId) -> SimInstance {
        instance_with(owner, bounds(), Box::new(NullBackend::default()), 20.0)
    }

    #[test]
    fn admission_is_deferred() {
        let mut manager = SimManager::new(20.0);
        let owner = OwnerId::random();

        manager.request_sim_add(null_sim(owner)).unwrap();
        assert!(manager.has_sim(owner));
        assert!(manager.owner_sim(owner).is_none());
        assert_eq!(manager.len(), 0);

        assert_eq!(manager.tick(), 1);
        assert_eq!(manager.owner_sim(owner).unwrap().ticks_advanced(), 1);
    }

    #[test]
    fn one_sim_per_owner() {
        let mut manager = SimManager::new(20.0);
        let owner = OwnerId::random();

        manager.request_sim_add(null_sim(owner)).unwrap();
        assert_eq!(manager.request_sim_add(null_sim(owner)), Err(SimError::SimStillActive));

        manager.tick();
        assert_eq!(manager.request_sim_add(null_sim(owner)), Err(SimError::SimStillActive));
        assert_eq!(manager.len(), 1);

        let other = OwnerId::random();
        manager.request_sim_add(null_sim(other)).unwrap();
        manager.tick();
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn removal_is_deferred() {
        let mut manager = SimManager::new(20.0);
        let owner = OwnerId::random();
        assert!(!manager.request_sim_remove(owner));

        manager.request_sim_add(null_sim(owner)).unwrap();
        manager.tick();

        assert!(manager.request_sim_remove(owner));
        assert!(!manager.has_sim(owner));
        assert!(manager.owner_sim(owner).is_some());
        assert!(!manager.request_sim_remove(owner));

        // Re-admission may be queued behind the removal.
        manager.request_sim_add(null_sim(owner)).unwrap();
        manager.tick();
        assert_eq!(manager.owner_sim(owner).unwrap().ticks_advanced(), 1);
    }

    #[test]
    fn queued_adds_reserve_regions() {
        let manager = SimManager::new(20.0);
        let owner = OwnerId::random();
        assert!(manager.reserved_regions().is_empty());

        manager.request_sim_add(null_sim(owner)).unwrap();
        let reserved = manager.reserved_regions();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].0, owner);
        assert_eq!(reserved[0].2, bounds());
    }

    #[test]
    fn evicts_invalid_backends_after_tick() {
        let mut manager = SimManager::new(20.0);
        let doomed = OwnerId::random();
        let healthy = OwnerId::random();

        manager
            .request_sim_add(instance_with(doomed, bounds(), Box::new(Budgeted { budget: 2 }), 20.0))
            .unwrap();
        manager.request_sim_add(null_sim(healthy)).unwrap();

        manager.tick();
        assert_eq!(manager.len(), 2);
        manager.tick();
        assert_eq!(manager.len(), 1);
        assert!(manager.owner_sim(doomed).is_none());
        assert!(manager.owner_sim(healthy).is_some());
        assert_eq!(manager.host_ticks(), 2);
    }
}
