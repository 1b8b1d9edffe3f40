//! Shared helpers for marionette tests: app builders with the standard
//! plugin combinations and spawners for simple joint rigs.

pub mod app;
pub mod rig;

pub use app::{ik_test_app, minimal_test_app};
pub use rig::{spawn_chain_rig, world_isometry, ChainRig};
