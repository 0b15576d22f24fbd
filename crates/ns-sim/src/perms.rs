//! Permission nodes and the permission collaborator.

use crate::OwnerId;

pub const SELECT: &str = "norestone.simulation.selection.select";
pub const CHANGE_SEL_WAND: &str = "norestone.simulation.selection.changeselwand";
pub const COMPILE: &str = "norestone.simulation.compile";
pub const CHANGE_TPS: &str = "norestone.simulation.changetps";
pub const STEP: &str = "norestone.simulation.step";
pub const FREEZE: &str = "norestone.simulation.freeze";
pub const CLEAR: &str = "norestone.simulation.clear";
pub const MAX_TPS_BYPASS: &str = "norestone.simulation.maxtps.bypass";

/// Answers whether an owner holds a permission node.
pub trait Permissions {
    fn has_permission(&self, owner: OwnerId, node: &str) -> bool;
}

impl<F> Permissions for F
where
    F: Fn(OwnerId, &str) -> bool,
{
    fn has_permission(&self, owner: OwnerId, node: &str) -> bool {
        self(owner, node)
    }
}

/// Grants every node to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn has_permission(&self, _owner: OwnerId, _node: &str) -> bool {
        true
    }
}
