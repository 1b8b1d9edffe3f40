//! Inverse kinematics for bevy joint hierarchies.
//!
//! An [`IkEffector`] component sits on the end joint of a chain and carries
//! the chain goal: a target pose plus blending parameters. An [`IkSolver`]
//! component marks the root of the joint hierarchy the chain may extend
//! into. Each update the pipeline resolves every effector's goal, runs a
//! FABRIK solve per chain and blends the solved pose against the pre-solve
//! pose per joint.
//!
//! # Architecture
//!
//! ```text
//! IkEffector ──► goal resolution ──► FabrikSolver ──► chain blend ──► Transforms
//!      │                                  ▲
//!      └── binding (ChainArena slot) ─────┘
//! ```
//!
//! # Usage
//!
//! 1. Add [`MarionetteCorePlugin`](marionette_core::MarionetteCorePlugin)
//!    and [`MarionetteIkPlugin`] to your app.
//! 2. Put an [`IkSolver`] on the rig root and an [`IkEffector`] on the end
//!    joint of each chain.
//! 3. Point the effector at a target node, a node name, or a cached pose.
//!
//! Newly added effectors bind to their nearest ancestor solver
//! automatically; [`binding::bind`]/[`binding::unbind`] are the explicit
//! registration surface.

pub mod binding;
pub mod blend;
pub mod chain;
pub mod debug;
pub mod effector;
pub mod plugin;
pub mod solver;
pub mod target;

pub use binding::{ChainArena, ChainSlot, IkSolver};
pub use blend::BlendSettings;
pub use effector::IkEffector;
pub use plugin::{IkSolverConfig, MarionetteIkPlugin};
pub use solver::{FabrikConfig, FabrikSolver, SolveReport};

pub mod prelude {
    pub use crate::binding::{ChainArena, ChainSlot, IkSolver};
    pub use crate::blend::BlendSettings;
    pub use crate::debug::{DebugDrawConfig, DebugGeometry};
    pub use crate::effector::IkEffector;
    pub use crate::plugin::{IkSolverConfig, MarionetteIkPlugin};
    pub use crate::solver::{FabrikConfig, FabrikSolver, SolveReport};
}
