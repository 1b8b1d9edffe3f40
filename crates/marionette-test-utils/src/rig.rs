//! Spawners for simple joint rigs used across tests.

use bevy::prelude::*;
use nalgebra::Isometry3;

use marionette_core::math::transform_to_isometry;
use marionette_ik::IkSolver;

/// A spawned linear test rig: one solver root with a chain of joints below.
#[derive(Debug)]
pub struct ChainRig {
    pub solver: Entity,
    /// Joint entities, base first. The last joint is where tests usually
    /// put the effector.
    pub joints: Vec<Entity>,
}

impl ChainRig {
    pub fn end(&self) -> Entity {
        *self.joints.last().expect("rig has at least one joint")
    }
}

/// Spawn a solver root at the origin with `joints` chain joints below it.
///
/// The first joint sits at the root's origin; every further joint is offset
/// `spacing` along +Z from its parent, so the rig rests pointing straight
/// up with uniform bone lengths.
pub fn spawn_chain_rig(world: &mut World, joints: usize, spacing: f32) -> ChainRig {
    let solver = world.spawn((Transform::IDENTITY, IkSolver::new())).id();
    let mut entities = Vec::new();
    let mut previous = solver;
    for i in 0..joints {
        let offset = if i == 0 { 0.0 } else { spacing };
        let joint = world.spawn(Transform::from_xyz(0.0, 0.0, offset)).id();
        world.entity_mut(joint).set_parent(previous);
        entities.push(joint);
        previous = joint;
    }
    ChainRig {
        solver,
        joints: entities,
    }
}

/// Compose an entity's world isometry from local transforms, independent of
/// bevy's `GlobalTransform` propagation timing.
pub fn world_isometry(world: &World, entity: Entity) -> Isometry3<f32> {
    let mut lineage = vec![entity];
    let mut current = entity;
    while let Some(parent) = world.get::<Parent>(current) {
        current = parent.get();
        lineage.push(current);
    }

    let mut iso = Isometry3::identity();
    for &node in lineage.iter().rev() {
        if let Some(transform) = world.get::<Transform>(node) {
            iso *= transform_to_isometry(transform);
        }
    }
    iso
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
