//! Bevy integration: binding maintenance, goal resolution and the per-pass
//! solve/blend/write-back.
//!
//! Systems are grouped into [`MarionetteSet`] so that every bound chain's
//! goal is resolved before any chain is solved or blended. A solve pass is
//! atomic per frame: chains with unusable input (missing target, degenerate
//! topology) are skipped for that frame only and keep their last blended
//! pose; nothing aborts the pass.

use bevy::log::{debug, warn};
use bevy::prelude::*;
use nalgebra::{Isometry3, Translation3};

use marionette_core::config::MarionetteConfig;
use marionette_core::math::{quat_from_na, quat_to_na, transform_to_isometry, vec_from_na};
use marionette_core::types::JointPose;
use marionette_core::MarionetteSet;

use crate::binding::{self, ChainArena, IkSolver};
use crate::blend::{blend_chain_into, BlendSettings};
use crate::debug::{collect_debug_geometry, DebugDrawConfig, DebugGeometry};
use crate::effector::IkEffector;
use crate::solver::{FabrikConfig, FabrikSolver};
use crate::target::resolve_goal;

/// Shared numeric solve parameters.
#[derive(Resource, Debug, Clone, Default)]
pub struct IkSolverConfig(pub FabrikConfig);

/// Adds the IK pipeline. Expects
/// [`MarionetteCorePlugin`](marionette_core::MarionetteCorePlugin) for the
/// set ordering and configuration resource.
pub struct MarionetteIkPlugin;

impl Plugin for MarionetteIkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChainArena>()
            .init_resource::<IkSolverConfig>()
            .init_resource::<DebugGeometry>()
            .init_resource::<DebugDrawConfig>()
            .add_systems(Startup, seed_solver_config)
            .add_systems(
                Update,
                (
                    (release_removed_chains, maintain_bindings)
                        .chain()
                        .in_set(MarionetteSet::Bind),
                    (late_bind_target_names, resolve_goals)
                        .chain()
                        .in_set(MarionetteSet::Resolve),
                    (solve_chains, collect_debug.run_if(debug_draw_enabled))
                        .chain()
                        .in_set(MarionetteSet::Solve),
                ),
            );
    }
}

/// Copy the file-level solve parameters into [`IkSolverConfig`].
fn seed_solver_config(
    config: Option<Res<MarionetteConfig>>,
    mut solver_config: ResMut<IkSolverConfig>,
) {
    if let Some(config) = config {
        solver_config.0.max_iterations = config.solver.max_iterations;
        solver_config.0.tolerance = config.solver.tolerance;
    }
}

// ---------------------------------------------------------------------------
// Bind set
// ---------------------------------------------------------------------------

/// Free arena slots whose effector or solver entity went away. Runs before
/// anything else touches the arena so a despawned effector can never be
/// solved.
pub fn release_removed_chains(
    mut arena: ResMut<ChainArena>,
    mut removed_effectors: RemovedComponents<IkEffector>,
    mut removed_solvers: RemovedComponents<IkSolver>,
    mut effectors: Query<&mut IkEffector>,
) {
    for entity in removed_effectors.read() {
        arena.release_for_effector(entity);
    }
    for solver in removed_solvers.read() {
        for effector_entity in arena.release_for_solver(solver) {
            if let Ok(mut effector) = effectors.get_mut(effector_entity) {
                effector.set_binding(None);
            }
        }
    }
}

/// Bind new effectors to their nearest ancestor solver and re-resolve
/// topology after chain-length writes or hierarchy changes.
///
/// Topology resolution is driven by change detection, never by the frame
/// clock: an unchanged rig re-uses its cached joint chains indefinitely.
#[allow(clippy::too_many_arguments)]
pub fn maintain_bindings(
    mut arena: ResMut<ChainArena>,
    mut effectors: Query<(Entity, &mut IkEffector)>,
    changed_parents: Query<(), Changed<Parent>>,
    added_solvers: Query<(), Added<IkSolver>>,
    mut removed_parents: RemovedComponents<Parent>,
    parents: Query<&Parent>,
    solvers: Query<(), With<IkSolver>>,
    transforms: Query<&Transform>,
) {
    let hierarchy_dirty = !changed_parents.is_empty()
        || !added_solvers.is_empty()
        || removed_parents.read().next().is_some();

    for (entity, mut effector) in &mut effectors {
        let needs_refresh =
            hierarchy_dirty || effector.is_added() || effector.topology_dirty();
        if !needs_refresh {
            continue;
        }

        match find_solver_above(entity, &parents, &solvers) {
            Some(solver_entity) => {
                let result = binding::bind(
                    &mut arena,
                    entity,
                    &mut *effector,
                    solver_entity,
                    |node| parents.get(node).ok().map(Parent::get),
                    |node| transforms.get(node).ok().map(|t| quat_to_na(t.rotation)),
                );
                if let Err(err) = result {
                    warn!("marionette-ik: binding effector {entity:?} failed: {err}");
                }
            }
            None => {
                if effector.binding().is_some() {
                    binding::unbind(&mut arena, &mut *effector);
                    warn!("marionette-ik: effector {entity:?} has no ancestor solver; unbound");
                }
                effector.clear_topology_dirty();
            }
        }
    }
}

/// Nearest ancestor of `entity` carrying [`IkSolver`].
fn find_solver_above(
    entity: Entity,
    parents: &Query<&Parent>,
    solvers: &Query<(), With<IkSolver>>,
) -> Option<Entity> {
    let mut current = entity;
    while let Ok(parent) = parents.get(current) {
        let parent = parent.get();
        if solvers.contains(parent) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

// ---------------------------------------------------------------------------
// Resolve set
// ---------------------------------------------------------------------------

/// Adopt scene nodes for pending target names.
///
/// A pending name is checked against the scene's `Name` components each
/// update until a match appears, so a node created after the request is
/// picked up on its first frame.
pub fn late_bind_target_names(
    mut effectors: Query<&mut IkEffector>,
    names: Query<(Entity, &Name)>,
) {
    for mut effector in &mut effectors {
        let Some(pending) = effector.target_name().map(str::to_owned) else {
            continue;
        };
        if let Some((node, _)) = names.iter().find(|(_, name)| name.as_str() == pending) {
            effector.adopt_target(node);
        }
    }
}

/// Resolve every bound chain's goal pose.
///
/// Runs for all chains before any solve; recomputation is idempotent
/// absent target mutation, so a chain resolved twice in one pass yields
/// the same goal.
#[allow(clippy::needless_pass_by_value)]
pub fn resolve_goals(
    mut arena: ResMut<ChainArena>,
    effectors: Query<&IkEffector>,
    solvers: Query<&IkSolver>,
    parents: Query<&Parent>,
    transforms: Query<&Transform>,
) {
    for state in arena.iter_mut() {
        let Ok(effector) = effectors.get(state.effector) else {
            state.goal = None;
            continue;
        };
        let enabled = solvers
            .get(state.solver)
            .map(|solver| solver.enabled)
            .unwrap_or(false);
        if !enabled {
            state.goal = None;
            continue;
        }

        state.goal = resolve_goal(effector, |node| {
            // The node itself must still exist and carry a transform;
            // ancestors without one count as identity.
            transforms.get(node).ok()?;
            let world = world_isometry(
                node,
                |e| parents.get(e).ok().map(Parent::get),
                |e| transforms.get(e).ok().map(transform_to_isometry),
            );
            Some((world.translation.vector, world.rotation))
        });
    }
}

/// Compose a node's world isometry from local transforms up the hierarchy.
fn world_isometry(
    entity: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
    local_of: impl Fn(Entity) -> Option<Isometry3<f32>>,
) -> Isometry3<f32> {
    let mut lineage = vec![entity];
    let mut current = entity;
    while let Some(parent) = parent_of(current) {
        lineage.push(parent);
        current = parent;
    }

    let mut world = Isometry3::identity();
    for &node in lineage.iter().rev() {
        if let Some(local) = local_of(node) {
            world *= local;
        }
    }
    world
}

// ---------------------------------------------------------------------------
// Solve set
// ---------------------------------------------------------------------------

/// Solve and blend every chain with a resolved goal, then write the final
/// poses back as local transforms.
#[allow(clippy::needless_pass_by_value)]
pub fn solve_chains(
    mut arena: ResMut<ChainArena>,
    effectors: Query<&IkEffector>,
    solvers: Query<&IkSolver>,
    parents: Query<&Parent>,
    mut transforms: Query<&mut Transform>,
    solver_config: Res<IkSolverConfig>,
) {
    let fabrik = FabrikSolver::new(solver_config.0.clone());

    for state in arena.iter_mut() {
        let Some(goal) = state.goal else {
            // Missing target: the chain keeps its last blended pose.
            continue;
        };
        let Ok(effector) = effectors.get(state.effector) else {
            continue;
        };
        let Ok(ik_solver) = solvers.get(state.solver) else {
            continue;
        };
        // Weight 0 means the solved pose would be ignored entirely; leave
        // the transforms untouched.
        if effector.weight() <= 0.0 {
            continue;
        }
        let Some(&base) = state.topology.first() else {
            continue;
        };

        // Pre-solve pose, composed from current local transforms so the
        // pass never depends on last frame's propagated globals.
        let base_parent_world = match parents.get(base) {
            Ok(parent) => world_isometry(
                parent.get(),
                |e| parents.get(e).ok().map(Parent::get),
                |e| transforms.get(e).ok().map(transform_to_isometry),
            ),
            Err(_) => Isometry3::identity(),
        };

        state.initial.clear();
        let mut world = base_parent_world;
        let mut stale = false;
        for (i, &joint) in state.topology.iter().enumerate() {
            let Ok(transform) = transforms.get(joint) else {
                stale = true;
                break;
            };
            let mut local = transform_to_isometry(transform);
            if i == 0 && effector.inherit_parent_rotation_enabled() {
                local.rotation = state.base_rest_local_rotation;
            }
            world *= local;
            state
                .initial
                .push(JointPose::new(world.translation.vector, world.rotation));
        }
        if stale {
            // A joint vanished mid-frame; binding maintenance rebuilds the
            // topology next pass.
            continue;
        }

        if let Err(err) = fabrik.solve_into(
            &state.initial,
            &goal,
            ik_solver.match_target_rotation,
            &mut state.solved,
        ) {
            debug!(
                "marionette-ik: {err}; skipping chain for effector {:?}",
                state.effector
            );
            continue;
        }

        let settings = BlendSettings {
            weight: effector.weight(),
            rotation_weight: effector.rotation_weight(),
            rotation_decay: effector.rotation_decay(),
            weighted_nlerp: effector.weighted_nlerp_enabled(),
            match_target_rotation: ik_solver.match_target_rotation,
        };
        blend_chain_into(&state.initial, &state.solved, &settings, &mut state.blended);

        // Write back: convert final world poses to local transforms walking
        // base to end, tracking the updated parent world pose.
        let mut parent_world = base_parent_world;
        for (i, &joint) in state.topology.iter().enumerate() {
            let pose = state.blended[i];
            let world =
                Isometry3::from_parts(Translation3::from(pose.position), pose.rotation);
            let local = parent_world.inv_mul(&world);
            if let Ok(mut transform) = transforms.get_mut(joint) {
                transform.translation = vec_from_na(&local.translation.vector);
                transform.rotation = quat_from_na(&local.rotation);
            }
            parent_world = world;
        }
    }
}

fn debug_draw_enabled(config: Res<DebugDrawConfig>) -> bool {
    config.enabled
}

#[allow(clippy::needless_pass_by_value)]
fn collect_debug(arena: Res<ChainArena>, mut buffer: ResMut<DebugGeometry>) {
    collect_debug_geometry(&arena, &mut buffer);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
