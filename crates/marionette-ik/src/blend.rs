//! Chain blend policy: combines a solved pose with the pre-solve pose.
//!
//! Positions blend per joint by lerp, or rotationally about the chain base
//! when weighted nlerp is on and the weight sits strictly between 0 and 1.
//! Rotations blend toward the solver output on a per-joint schedule
//! `rotation_weight * rotation_decay^i` (i = 0 at the base), and only when
//! the owning solver matches the target rotation at all.

use nalgebra::UnitQuaternion;

use marionette_core::types::{ChainPose, JointPose};

/// Blend inputs for one chain, assembled from the effector and its solver.
#[derive(Debug, Clone, Copy)]
pub struct BlendSettings {
    /// Solved-vs-initial fraction for positions, in [0, 1].
    pub weight: f32,
    /// Target-rotation influence at the base joint, in [0, 1].
    pub rotation_weight: f32,
    /// Per-joint falloff of `rotation_weight` down the chain, in [0, 1].
    pub rotation_decay: f32,
    /// Blend intermediate weights as a rotation about the chain base.
    pub weighted_nlerp: bool,
    /// The owning solver's target-rotation flag. When false the rotation
    /// schedule does not apply at all.
    pub match_target_rotation: bool,
}

impl Default for BlendSettings {
    fn default() -> Self {
        Self {
            weight: 1.0,
            rotation_weight: 1.0,
            rotation_decay: 0.25,
            weighted_nlerp: false,
            match_target_rotation: false,
        }
    }
}

/// Rotation influence for joint `i`, base = 0.
pub fn effective_rotation_weight(settings: &BlendSettings, i: usize) -> f32 {
    (settings.rotation_weight * settings.rotation_decay.powi(i as i32)).clamp(0.0, 1.0)
}

/// Blend `solved` against `initial`, producing the final chain pose.
pub fn blend_chain(initial: &ChainPose, solved: &ChainPose, settings: &BlendSettings) -> ChainPose {
    let mut out = ChainPose::default();
    blend_chain_into(initial, solved, settings, &mut out);
    out
}

/// Like [`blend_chain`], writing into a reusable buffer.
///
/// # Panics
///
/// Panics if `initial` and `solved` have different lengths.
pub fn blend_chain_into(
    initial: &ChainPose,
    solved: &ChainPose,
    settings: &BlendSettings,
    out: &mut ChainPose,
) {
    assert_eq!(initial.len(), solved.len(), "chain pose lengths must match");

    out.clear();
    let n = initial.len();

    // Weight 0: the solved pose is ignored entirely.
    if settings.weight <= 0.0 {
        for i in 0..n {
            out.push(initial[i]);
        }
        return;
    }

    let w = settings.weight;
    let full = w >= 1.0;

    if settings.weighted_nlerp && !full && n > 0 {
        // Rotational blend about the chain base: carry the whole initial
        // pose by the weighted base-orientation displacement instead of
        // lerping world positions (which cuts corners on rotating limbs).
        let displacement = solved[0].rotation * initial[0].rotation.inverse();
        let carried = slerp_or_flip(&UnitQuaternion::identity(), &displacement, w);
        let base = initial[0].position.lerp(&solved[0].position, w);

        for i in 0..n {
            let offset = initial[i].position - initial[0].position;
            out.push(JointPose::new(
                base + carried * offset,
                carried * initial[i].rotation,
            ));
        }
    } else {
        for i in 0..n {
            let position = if full {
                solved[i].position
            } else {
                initial[i].position.lerp(&solved[i].position, w)
            };
            out.push(JointPose::new(position, solved[i].rotation));
        }
    }

    // Target-rotation schedule, gated on the solver's matching flag.
    if settings.match_target_rotation {
        for i in 0..n {
            let erw = effective_rotation_weight(settings, i);
            out[i].rotation = slerp_or_flip(&initial[i].rotation, &solved[i].rotation, erw);
        }
    }
}

/// Shortest-path slerp with a defined result for sign-flipped and
/// near-antipodal pairs.
fn slerp_or_flip(
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
    t: f32,
) -> UnitQuaternion<f32> {
    let b = if a.coords.dot(&b.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-b.into_inner())
    } else {
        *b
    };
    match a.try_slerp(&b, t, 1.0e-6) {
        Some(q) => q,
        // Both failure modes leave a and b representing (nearly) the same
        // rotation; either endpoint is correct.
        None if t < 0.5 => *a,
        None => b,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
