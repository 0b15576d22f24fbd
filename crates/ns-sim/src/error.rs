//! Simulation error types.
//!
//! Every owner-facing operation returns [`SimResult`]. The `Display` text of
//! each variant is the message shown to the owner, so wording is distinct per
//! cause.

use ns_backend::BackendError;
use ns_volume::VolumeError;
use thiserror::Error;

/// Broad failure category, for callers that react differently per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PermissionDenied,
    Validation,
    StateConflict,
    Parameter,
    BackendFault,
}

/// Simulation error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("You do not have the permission '{0}'.")]
    PermissionDenied(&'static str),

    #[error("Your permissions do not permit you to go over {0} TPS.")]
    TpsAboveMax(f64),

    #[error(
        "Trying to select in 2 different worlds. Keep it in the same world, \
         or do \"/sim desel\" and start selecting again."
    )]
    CrossWorld,

    #[error("Your selection is incomplete. Select both corners first.")]
    SelectionIncomplete,

    #[error("Your selection is too large ({volume} blocks, the maximum is {max}).")]
    SelectionTooLarge { volume: u64, max: u64 },

    #[error("Your selection is too long ({side} blocks on one side, the maximum is {max}).")]
    SelectionTooLong { side: i64, max: i32 },

    #[error("Your selection reaches past the edge of the world's coordinates.")]
    SelectionOutOfRange,

    #[error("Your selection overlaps a simulation that is already running.")]
    SelectionOverlap,

    #[error("Unknown backend of id '{0}'.")]
    UnknownBackend(String),

    #[error("The world of your selection is not loaded.")]
    WorldUnavailable,

    #[error("Cannot bind simulation selection wand to empty.")]
    EmptySelectionTool,

    #[error("Cannot compile the selection: {0}")]
    Volume(#[from] VolumeError),

    #[error("Your simulation is still active, please clear it before trying to compile a new one.")]
    SimStillActive,

    #[error("No simulation currently on-going.")]
    NoSimulation,

    #[error("Cannot step while the simulation isn't frozen.")]
    NotFrozen,

    #[error("The world can only be read from the server thread.")]
    OffHostThread,

    #[error("TPS cannot be negative.")]
    NegativeTps,

    #[error("TPS cannot be 0.")]
    ZeroTps,

    #[error("TPS must be a finite number.")]
    NonFiniteTps,

    #[error("Cannot step for a negative amount of ticks.")]
    NegativeStep,

    #[error("Cannot step for 0 ticks.")]
    ZeroStep,

    #[error("{0}")]
    BackendFault(String),
}

impl SimError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied(_) | Self::TpsAboveMax(_) => ErrorKind::PermissionDenied,
            Self::CrossWorld
            | Self::SelectionIncomplete
            | Self::SelectionTooLarge { .. }
            | Self::SelectionTooLong { .. }
            | Self::SelectionOutOfRange
            | Self::SelectionOverlap
            | Self::UnknownBackend(_)
            | Self::WorldUnavailable
            | Self::EmptySelectionTool
            | Self::Volume(_) => ErrorKind::Validation,
            Self::SimStillActive | Self::NoSimulation | Self::NotFrozen | Self::OffHostThread => {
                ErrorKind::StateConflict
            }
            Self::NegativeTps
            | Self::ZeroTps
            | Self::NonFiniteTps
            | Self::NegativeStep
            | Self::ZeroStep => ErrorKind::Parameter,
            Self::BackendFault(_) => ErrorKind::BackendFault,
        }
    }
}

impl From<BackendError> for SimError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Fault(msg) => Self::BackendFault(msg),
            other => Self::BackendFault(other.to_string()),
        }
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_owner_facing_wording() {
        assert_eq!(
            SimError::UnknownBackend("unknown".into()).to_string(),
            "Unknown backend of id 'unknown'."
        );
        assert_eq!(
            SimError::NotFrozen.to_string(),
            "Cannot step while the simulation isn't frozen."
        );
        assert_eq!(
            SimError::CrossWorld.to_string(),
            "Trying to select in 2 different worlds. Keep it in the same world, \
             or do \"/sim desel\" and start selecting again."
        );
        assert_eq!(
            SimError::TpsAboveMax(20.0).to_string(),
            "Your permissions do not permit you to go over 20 TPS."
        );
    }

    #[test]
    fn negative_and_zero_are_distinct() {
        assert_ne!(SimError::NegativeTps.to_string(), SimError::ZeroTps.to_string());
        assert_ne!(SimError::NegativeStep.to_string(), SimError::ZeroStep.to_string());
        assert_eq!(SimError::ZeroStep.kind(), ErrorKind::Parameter);
    }

    #[test]
    fn backend_faults_keep_their_message() {
        let err = SimError::from(BackendError::Fault("netlist has a cycle".into()));
        assert_eq!(err.kind(), ErrorKind::BackendFault);
        assert_eq!(err.to_string(), "netlist has a cycle");
    }
}
