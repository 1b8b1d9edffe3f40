//! FABRIK chain solver.
//!
//! Forward-and-backward reaching IK over the joint positions of a single
//! chain, followed by a rotation pass that carries each joint's pre-solve
//! orientation along its bone's change of direction. The solver works on
//! plain pose buffers and knows nothing about the ECS.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use thiserror::Error;

use marionette_core::types::{ChainPose, GoalPose};

/// Minimum usable bone/chain length, in scene units.
const LENGTH_EPSILON: f32 = 1.0e-6;

/// Per-pass solve failure. Not propagated beyond the solve call site; the
/// affected chain is simply skipped for the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("Degenerate chain: fewer than two joints or zero total length")]
    DegenerateChain,
}

/// Configuration for the FABRIK solver.
#[derive(Debug, Clone)]
pub struct FabrikConfig {
    /// Maximum forward/backward iterations per pass.
    pub max_iterations: u32,
    /// End-joint distance to the goal considered converged (scene units).
    pub tolerance: f32,
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self {
            max_iterations: 24,
            tolerance: 1.0e-4,
        }
    }
}

/// Result of one chain solve.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Whether the end joint reached the goal within tolerance.
    pub converged: bool,
    /// Iterations used. Zero when the pose already satisfied the goal or
    /// the goal was unreachable and the chain was laid out directly.
    pub iterations: u32,
    /// Final end-joint distance to the goal (scene units).
    pub position_error: f32,
}

/// FABRIK solver over a single chain.
pub struct FabrikSolver {
    config: FabrikConfig,
}

impl FabrikSolver {
    pub const fn new(config: FabrikConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FabrikConfig::default())
    }

    pub const fn config(&self) -> &FabrikConfig {
        &self.config
    }

    /// Solve the chain toward `goal`, returning a fresh solved pose.
    ///
    /// `match_rotation` substitutes the goal rotation for the end joint's
    /// derived rotation (the solver owner's target-rotation flag).
    ///
    /// # Errors
    ///
    /// [`SolveError::DegenerateChain`] for chains with fewer than two
    /// joints or near-zero total length.
    pub fn solve(
        &self,
        initial: &ChainPose,
        goal: &GoalPose,
        match_rotation: bool,
    ) -> Result<(ChainPose, SolveReport), SolveError> {
        let mut solved = ChainPose::default();
        let report = self.solve_into(initial, goal, match_rotation, &mut solved)?;
        Ok((solved, report))
    }

    /// Like [`solve`](Self::solve), writing into a reusable buffer.
    pub fn solve_into(
        &self,
        initial: &ChainPose,
        goal: &GoalPose,
        match_rotation: bool,
        out: &mut ChainPose,
    ) -> Result<SolveReport, SolveError> {
        let n = initial.len();
        if n < 2 {
            return Err(SolveError::DegenerateChain);
        }

        let lengths: Vec<f32> = (0..n - 1)
            .map(|i| (initial[i + 1].position - initial[i].position).norm())
            .collect();
        let total: f32 = lengths.iter().sum();
        if total <= LENGTH_EPSILON {
            return Err(SolveError::DegenerateChain);
        }

        out.clear();
        for i in 0..n {
            out.push(initial[i]);
        }

        let base = initial[0].position;
        let target = goal.position;
        let mut iterations = 0;

        if (target - base).norm() > total {
            // Unreachable: lay the chain out straight toward the goal.
            for i in 0..n - 1 {
                let to_target = target - out[i].position;
                let dir = to_target
                    .try_normalize(LENGTH_EPSILON)
                    .unwrap_or_else(Vector3::z);
                out[i + 1].position = out[i].position + dir * lengths[i];
            }
        } else {
            for iteration in 0..self.config.max_iterations {
                if (out[n - 1].position - target).norm() <= self.config.tolerance {
                    break;
                }
                iterations = iteration + 1;

                // Backward pass: pin the end joint to the goal, pull the
                // rest of the chain toward it.
                out[n - 1].position = target;
                for i in (0..n - 1).rev() {
                    let dir = (out[i].position - out[i + 1].position)
                        .try_normalize(LENGTH_EPSILON)
                        .unwrap_or_else(Vector3::z);
                    out[i].position = out[i + 1].position + dir * lengths[i];
                }

                // Forward pass: pin the base back where it belongs.
                out[0].position = base;
                for i in 0..n - 1 {
                    let dir = (out[i + 1].position - out[i].position)
                        .try_normalize(LENGTH_EPSILON)
                        .unwrap_or_else(Vector3::z);
                    out[i + 1].position = out[i].position + dir * lengths[i];
                }
            }
        }

        let position_error = (out[n - 1].position - target).norm();
        let converged = position_error <= self.config.tolerance;

        derive_rotations(initial, out, goal, match_rotation);

        Ok(SolveReport {
            converged,
            iterations,
            position_error,
        })
    }
}

/// Carry each joint's pre-solve orientation along its bone's change of
/// direction; the end joint takes the goal rotation when matching is on.
fn derive_rotations(initial: &ChainPose, out: &mut ChainPose, goal: &GoalPose, match_rotation: bool) {
    let n = initial.len();
    let mut last_delta = UnitQuaternion::identity();
    for i in 0..n - 1 {
        let before = initial[i + 1].position - initial[i].position;
        let after = out[i + 1].position - out[i].position;
        let delta = rotation_carrying(&before, &after);
        out[i].rotation = delta * initial[i].rotation;
        last_delta = delta;
    }
    out[n - 1].rotation = if match_rotation {
        goal.rotation
    } else {
        last_delta * initial[n - 1].rotation
    };
}

/// Rotation carrying `from` onto `to`.
///
/// Antiparallel directions have no unique shortest arc; a half-turn about
/// an arbitrary perpendicular axis is used. Degenerate inputs map to the
/// identity.
fn rotation_carrying(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    let (Some(from), Some(to)) = (
        from.try_normalize(LENGTH_EPSILON),
        to.try_normalize(LENGTH_EPSILON),
    ) else {
        return UnitQuaternion::identity();
    };

    UnitQuaternion::rotation_between(&from, &to)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&any_perpendicular(&from), std::f32::consts::PI))
}

/// Any unit vector perpendicular to `v` (which must be non-zero).
fn any_perpendicular(v: &Vector3<f32>) -> Unit<Vector3<f32>> {
    let candidate = if v.x.abs() < 0.9 * v.norm() {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&candidate))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
