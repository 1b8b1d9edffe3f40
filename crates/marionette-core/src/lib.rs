// marionette-core: types, errors, config and schedule ordering for the marionette IK stack.

pub mod config;
pub mod error;
pub mod math;
pub mod types;

use bevy::prelude::*;

/// Update-schedule ordering for the IK pipeline.
///
/// Every bound effector's goal is resolved in [`MarionetteSet::Resolve`]
/// before any chain is solved or blended in [`MarionetteSet::Solve`]; a
/// solver may need all goals at once to handle shared-chain topology.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarionetteSet {
    /// Chain registration and topology maintenance.
    Bind,
    /// Target-name late binding and goal-pose resolution.
    Resolve,
    /// Numerical solve, blending, transform write-back.
    Solve,
}

/// Registers the [`MarionetteSet`] ordering and the shared configuration
/// resource. All other marionette plugins expect this one to be present.
pub struct MarionetteCorePlugin;

impl Plugin for MarionetteCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::MarionetteConfig>().configure_sets(
            Update,
            (
                MarionetteSet::Bind,
                MarionetteSet::Resolve,
                MarionetteSet::Solve,
            )
                .chain(),
        );
    }
}

pub mod prelude {
    pub use crate::config::MarionetteConfig;
    pub use crate::error::{BindError, ConfigError, MarionetteError};
    pub use crate::types::{ChainPose, EffectorHandle, GoalPose, JointPose, SolverHandle};
    pub use crate::{MarionetteCorePlugin, MarionetteSet};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
