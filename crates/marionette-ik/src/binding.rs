//! Chain registration: the narrow two-way interface between effectors and
//! solvers.
//!
//! Per-chain numeric state lives in a [`ChainArena`] resource keyed by
//! [`ChainSlot`] (stable index plus generation), so binding and unbinding
//! never churn per-frame allocations and a stale slot can never alias a
//! reused one. Effector binding fields are crate-private; only this module
//! establishes or clears them, which preserves the solver-exclusive access
//! the component contract requires without a friend-class construct.

use bevy::ecs::entity::Entity;
use bevy::prelude::Component;
use nalgebra::UnitQuaternion;

use marionette_core::error::BindError;
use marionette_core::types::{ChainPose, GoalPose};

use crate::chain::resolve_topology;
use crate::effector::{Binding, IkEffector};

// ---------------------------------------------------------------------------
// IkSolver
// ---------------------------------------------------------------------------

/// Marks the root of a joint hierarchy and carries solver-scope settings.
///
/// Effectors attached to descendant joints bind to the nearest ancestor
/// solver; their chains extend up to (but never include) this entity.
#[derive(Component, Debug, Clone)]
pub struct IkSolver {
    /// Whether chains blend toward the goal rotation. When false, joint
    /// rotations are whatever the numerical solve produced and the
    /// effectors' rotation weights have no effect.
    pub match_target_rotation: bool,
    /// When false, every chain of this solver is skipped and keeps its
    /// last blended pose.
    pub enabled: bool,
}

impl Default for IkSolver {
    fn default() -> Self {
        Self {
            match_target_rotation: false,
            enabled: true,
        }
    }
}

impl IkSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: enable target-rotation matching.
    pub const fn with_target_rotation(mut self, enable: bool) -> Self {
        self.match_target_rotation = enable;
        self
    }
}

// ---------------------------------------------------------------------------
// ChainSlot / ChainState
// ---------------------------------------------------------------------------

/// Stable handle to a chain's numeric state in the [`ChainArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainSlot {
    index: u32,
    generation: u32,
}

impl ChainSlot {
    /// Arena index. Stable for the lifetime of one binding.
    pub const fn index(&self) -> u32 {
        self.index
    }
}

/// Per-chain numeric state, owned by the arena for exactly as long as the
/// effector stays bound.
#[derive(Debug)]
pub struct ChainState {
    /// The effector entity this state belongs to.
    pub effector: Entity,
    /// The owning solver entity.
    pub solver: Entity,
    /// Resolved joint chain, base first, end joint last.
    pub topology: Vec<Entity>,
    /// Goal for the current pass. `None` means the chain is skipped.
    pub goal: Option<GoalPose>,
    /// The base joint's local rotation captured at bind time, used when the
    /// effector inherits its parent rotation.
    pub base_rest_local_rotation: UnitQuaternion<f32>,
    /// Pre-solve pose buffer, reused across passes.
    pub initial: ChainPose,
    /// Solver output buffer, reused across passes.
    pub solved: ChainPose,
    /// Blend output buffer, reused across passes.
    pub blended: ChainPose,
}

impl ChainState {
    fn new(
        effector: Entity,
        solver: Entity,
        topology: Vec<Entity>,
        base_rest_local_rotation: UnitQuaternion<f32>,
    ) -> Self {
        Self {
            effector,
            solver,
            topology,
            goal: None,
            base_rest_local_rotation,
            initial: ChainPose::default(),
            solved: ChainPose::default(),
            blended: ChainPose::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChainArena
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    state: Option<ChainState>,
}

/// Arena of chain states, keyed by [`ChainSlot`].
#[derive(bevy::prelude::Resource, Debug, Default)]
pub struct ChainArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ChainArena {
    /// Number of live chains.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.state.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, slot: ChainSlot) -> Option<&ChainState> {
        let entry = self.slots.get(slot.index as usize)?;
        if entry.generation != slot.generation {
            return None;
        }
        entry.state.as_ref()
    }

    pub fn get_mut(&mut self, slot: ChainSlot) -> Option<&mut ChainState> {
        let entry = self.slots.get_mut(slot.index as usize)?;
        if entry.generation != slot.generation {
            return None;
        }
        entry.state.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainState> {
        self.slots.iter().filter_map(|slot| slot.state.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChainState> {
        self.slots.iter_mut().filter_map(|slot| slot.state.as_mut())
    }

    fn insert(&mut self, state: ChainState) -> ChainSlot {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.slots[index as usize];
            entry.state = Some(state);
            ChainSlot {
                index,
                generation: entry.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: Some(state),
            });
            ChainSlot {
                index,
                generation: 0,
            }
        }
    }

    fn remove(&mut self, slot: ChainSlot) -> Option<ChainState> {
        let entry = self.slots.get_mut(slot.index as usize)?;
        if entry.generation != slot.generation || entry.state.is_none() {
            return None;
        }
        let state = entry.state.take();
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot.index);
        state
    }

    /// Free the slot owned by `effector`, if any. Used when the effector
    /// entity is despawned and its component can no longer be asked.
    pub fn release_for_effector(&mut self, effector: Entity) {
        let found = self.slots.iter().enumerate().find_map(|(index, entry)| {
            entry
                .state
                .as_ref()
                .filter(|state| state.effector == effector)
                .map(|_| ChainSlot {
                    index: index as u32,
                    generation: entry.generation,
                })
        });
        if let Some(slot) = found {
            self.remove(slot);
        }
    }

    /// Free every slot owned by `solver`. Returns the affected effector
    /// entities so their components can be marked unbound.
    pub fn release_for_solver(&mut self, solver: Entity) -> Vec<Entity> {
        let slots: Vec<(ChainSlot, Entity)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry
                    .state
                    .as_ref()
                    .filter(|state| state.solver == solver)
                    .map(|state| {
                        (
                            ChainSlot {
                                index: index as u32,
                                generation: entry.generation,
                            },
                            state.effector,
                        )
                    })
            })
            .collect();

        slots
            .into_iter()
            .map(|(slot, effector)| {
                self.remove(slot);
                effector
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// bind / unbind
// ---------------------------------------------------------------------------

/// Bind an effector to a solver: resolve the chain topology, allocate the
/// numeric state and establish the back reference.
///
/// Rebinding an already-bound effector fully releases the prior state
/// before allocating the new one, so no per-chain numeric state can leak
/// across bindings.
///
/// # Errors
///
/// [`BindError::InvalidTopology`] when `solver_entity` is not an ancestor
/// of the effector's joint; the effector is left unbound.
pub fn bind(
    arena: &mut ChainArena,
    effector_entity: Entity,
    effector: &mut IkEffector,
    solver_entity: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
    local_rotation_of: impl Fn(Entity) -> Option<UnitQuaternion<f32>>,
) -> Result<ChainSlot, BindError> {
    // Release any prior binding first, whether to this solver or another.
    unbind(arena, effector);

    let topology = resolve_topology(
        effector_entity,
        effector.chain_length(),
        solver_entity,
        parent_of,
    )?;

    let base_rest_local_rotation = topology
        .first()
        .and_then(|&base| local_rotation_of(base))
        .unwrap_or_else(UnitQuaternion::identity);

    let slot = arena.insert(ChainState::new(
        effector_entity,
        solver_entity,
        topology,
        base_rest_local_rotation,
    ));
    effector.set_binding(Some(Binding {
        solver: solver_entity,
        slot,
    }));
    effector.clear_topology_dirty();
    Ok(slot)
}

/// Release an effector's binding and its numeric state. Safe to call on an
/// unbound effector; the second call is a no-op.
pub fn unbind(arena: &mut ChainArena, effector: &mut IkEffector) {
    if let Some(binding) = effector.binding() {
        arena.remove(binding.slot);
        effector.set_binding(None);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use bevy::ecs::world::World;

    struct Rig {
        solver: Entity,
        joints: Vec<Entity>,
        parents: HashMap<Entity, Entity>,
    }

    fn linear_rig(world: &mut World, len: usize) -> Rig {
        let solver = world.spawn_empty().id();
        let mut parents = HashMap::new();
        let mut joints = Vec::new();
        let mut previous = solver;
        for _ in 0..len {
            let joint = world.spawn_empty().id();
            parents.insert(joint, previous);
            joints.push(joint);
            previous = joint;
        }
        Rig {
            solver,
            joints,
            parents,
        }
    }

    impl Rig {
        fn parent_of(&self) -> impl Fn(Entity) -> Option<Entity> + '_ {
            |entity| self.parents.get(&entity).copied()
        }
    }

    fn no_rotation(_: Entity) -> Option<UnitQuaternion<f32>> {
        None
    }

    #[test]
    fn bind_allocates_state_and_back_reference() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 4);
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();
        let end = rig.joints[3];

        let slot = bind(
            &mut arena,
            end,
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        assert_eq!(effector.solver(), Some(rig.solver));
        let state = arena.get(slot).unwrap();
        assert_eq!(state.topology, rig.joints);
        assert_eq!(state.effector, end);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn bind_outside_hierarchy_fails_and_stays_unbound() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 2);
        let stranger = world.spawn_empty().id();
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();

        let err = bind(
            &mut arena,
            stranger,
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap_err();

        assert!(matches!(err, BindError::InvalidTopology { .. }));
        assert_eq!(effector.solver(), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn unbind_twice_is_a_no_op() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 3);
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();
        bind(
            &mut arena,
            rig.joints[2],
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        unbind(&mut arena, &mut effector);
        assert!(arena.is_empty());
        assert_eq!(effector.solver(), None);

        unbind(&mut arena, &mut effector); // second call: no-op
        assert!(arena.is_empty());
    }

    #[test]
    fn rebind_to_second_solver_leaves_no_residual_state() {
        // Two separate rigs; the effector joint of the second rig uses a
        // different chain length than the first binding did.
        let mut world = World::new();
        let rig_a = linear_rig(&mut world, 4);
        let rig_b = linear_rig(&mut world, 3);

        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new().with_chain_length(4);

        let slot_a = bind(
            &mut arena,
            rig_a.joints[3],
            &mut effector,
            rig_a.solver,
            rig_a.parent_of(),
            no_rotation,
        )
        .unwrap();

        effector.set_chain_length(2);
        let slot_b = bind(
            &mut arena,
            rig_b.joints[2],
            &mut effector,
            rig_b.solver,
            rig_b.parent_of(),
            no_rotation,
        )
        .unwrap();

        // First slot is gone; stale handle resolves to nothing.
        assert!(arena.get(slot_a).is_none());
        assert_eq!(arena.len(), 1);

        let state = arena.get(slot_b).unwrap();
        assert_eq!(state.solver, rig_b.solver);
        assert_eq!(state.topology, vec![rig_b.joints[1], rig_b.joints[2]]);
    }

    #[test]
    fn stale_slot_does_not_alias_reused_index() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 2);
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();

        let slot_a = bind(
            &mut arena,
            rig.joints[1],
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();
        unbind(&mut arena, &mut effector);

        let slot_b = bind(
            &mut arena,
            rig.joints[1],
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        // Index reused, generation bumped.
        assert_eq!(slot_a.index(), slot_b.index());
        assert_ne!(slot_a, slot_b);
        assert!(arena.get(slot_a).is_none());
        assert!(arena.get(slot_b).is_some());
    }

    #[test]
    fn release_for_effector_frees_slot() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 3);
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();
        bind(
            &mut arena,
            rig.joints[2],
            &mut effector,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        arena.release_for_effector(rig.joints[2]);
        assert!(arena.is_empty());
    }

    #[test]
    fn release_for_solver_reports_affected_effectors() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 4);
        let mut arena = ChainArena::default();

        let mut effector_a = IkEffector::new().with_chain_length(2);
        bind(
            &mut arena,
            rig.joints[1],
            &mut effector_a,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        let mut effector_b = IkEffector::new().with_chain_length(2);
        bind(
            &mut arena,
            rig.joints[3],
            &mut effector_b,
            rig.solver,
            rig.parent_of(),
            no_rotation,
        )
        .unwrap();

        let mut affected = arena.release_for_solver(rig.solver);
        affected.sort();
        let mut expected = vec![rig.joints[1], rig.joints[3]];
        expected.sort();
        assert_eq!(affected, expected);
        assert!(arena.is_empty());
    }

    #[test]
    fn bind_captures_base_rest_rotation() {
        let mut world = World::new();
        let rig = linear_rig(&mut world, 2);
        let mut arena = ChainArena::default();
        let mut effector = IkEffector::new();
        let rest = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5);

        let base = rig.joints[0];
        let slot = bind(
            &mut arena,
            rig.joints[1],
            &mut effector,
            rig.solver,
            rig.parent_of(),
            |entity| (entity == base).then_some(rest),
        )
        .unwrap();

        let state = arena.get(slot).unwrap();
        assert!((state.base_rest_local_rotation.angle() - 0.5).abs() < 1e-6);
    }
}
