//! Goal-pose resolution.
//!
//! Precedence: a live target node wins; a dead one disables the chain; with
//! no node reference at all the cached pose applies. Node liveness is
//! checked on every resolve through the pose lookup, never cached.

use bevy::ecs::entity::Entity;
use nalgebra::{UnitQuaternion, Vector3};

use marionette_core::types::GoalPose;

use crate::effector::IkEffector;

/// Resolve the effector's goal for this pass.
///
/// `world_pose_of` reads a node's current world pose and returns `None`
/// when the node no longer exists (or has no transform). Returns `None`
/// when the chain has no resolvable target and must be skipped, notably
/// when a previously valid node reference has died; the stale cached pose
/// is deliberately not reused.
pub fn resolve_goal(
    effector: &IkEffector,
    world_pose_of: impl Fn(Entity) -> Option<(Vector3<f32>, UnitQuaternion<f32>)>,
) -> Option<GoalPose> {
    match effector.target() {
        Some(node) => world_pose_of(node).map(|(position, rotation)| GoalPose::new(position, rotation)),
        None => Some(GoalPose::new(
            effector.target_position(),
            effector.target_rotation(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
