//! Chain topology resolution.
//!
//! A chain is the ordered list of joint entities from a base joint down to
//! the joint carrying the effector. Resolution walks parent links upward
//! from the end joint and stops at the owning solver's boundary; the solver
//! entity itself is never part of the chain.
//!
//! Topology is resolved at bind time and on topology changes (chain-length
//! writes, hierarchy mutations), never per frame. The result is cached in
//! the effector's [`ChainState`](crate::binding::ChainState).

use bevy::ecs::entity::Entity;

use marionette_core::error::BindError;

/// Resolve the joint chain for an effector.
///
/// `chain_length == 0` extends the chain to the solver boundary. A nonzero
/// value is an exact joint count, clamped at the boundary when it exceeds
/// the hierarchy depth below the solver.
///
/// Returned joints are ordered base first, end joint last. Consecutive
/// entries are direct parent/child pairs.
///
/// # Errors
///
/// [`BindError::InvalidTopology`] when `solver` is not an ancestor of `end`.
pub fn resolve_topology(
    end: Entity,
    chain_length: u32,
    solver: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
) -> Result<Vec<Entity>, BindError> {
    if !is_descendant(end, solver, &parent_of) {
        return Err(BindError::InvalidTopology {
            effector: end,
            solver,
        });
    }

    let mut joints = vec![end];
    let mut current = end;
    loop {
        if chain_length > 0 && joints.len() as u32 == chain_length {
            break;
        }
        // The descendant check above guarantees we hit the solver before
        // running out of parents.
        let Some(parent) = parent_of(current) else {
            break;
        };
        if parent == solver {
            break;
        }
        joints.push(parent);
        current = parent;
    }

    joints.reverse();
    Ok(joints)
}

/// Whether `ancestor` lies on the parent path above `node`.
pub fn is_descendant(
    node: Entity,
    ancestor: Entity,
    parent_of: impl Fn(Entity) -> Option<Entity>,
) -> bool {
    let mut current = node;
    while let Some(parent) = parent_of(current) {
        if parent == ancestor {
            return true;
        }
        current = parent;
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
