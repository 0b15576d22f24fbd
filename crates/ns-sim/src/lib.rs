//! Compile-and-run pipeline for region simulations.
//!
//! # Flow
//!
//! ```text
//! set corners ──► SelectionValidator ──► Session.selection
//!                                             │ compile_sim
//!                                             ▼
//!             LiveWorld ──extract_region──► ChunkedVolume
//!                                             │ BackendInit (capabilities)
//!                                             ▼
//!                          SimInstance { volume, backend, tps, frozen }
//!                                             │ request_sim_add (deferred)
//!                                             ▼
//!   host loop ──tick()──► SimManager: apply requests, then host_tick every sim
//! ```
//!
//! Everything here runs on the thread that owns the live world. Compiling
//! blocks that thread for the whole region scan; the world cannot be read
//! from anywhere else.
//!
//! # Usage
//!
//! ```ignore
//! let mut ns = Norestone::new(config, BackendRegistry::with_builtin(), perms);
//!
//! ns.set_sim_sel_corner(actor, BlockPos::new(0, 60, 0), Corner::First)?;
//! ns.set_sim_sel_corner(actor, BlockPos::new(15, 70, 15), Corner::Second)?;
//! let took = ns.compile_sim(actor.id, &worlds, "null", vec![])?;
//!
//! loop {
//!     ns.tick(); // once per host tick
//! }
//! ```

mod config;
mod error;
mod extract;
mod ids;
mod interactions;
mod manager;
pub mod memory;
pub mod perms;
mod selection;
mod sim;
mod validator;
mod world;

pub use config::{MaxTpsTier, NorestoneConfig};
pub use error::{ErrorKind, SimError, SimResult};
pub use extract::extract_region;
pub use ids::{Actor, OwnerId, WorldId};
pub use interactions::Norestone;
pub use manager::SimManager;
pub use perms::Permissions;
pub use selection::{Corner, Selection, Session, SessionStore, ToolItem};
pub use sim::{MAX_ADVANCES_PER_HOST_TICK, SimInstance, validate_tps};
pub use validator::SelectionValidator;
pub use world::{HostThread, LiveWorld, WorldChunk, WorldService};

pub use ns_backend as backend;
pub use ns_volume as volume;
