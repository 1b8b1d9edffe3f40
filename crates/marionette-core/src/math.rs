//! Conversions between bevy's glam types at the [`Transform`] boundary and
//! the nalgebra types the solver math runs on.
//!
//! Rig scale is not part of the IK model: transforms are treated as rigid
//! isometries and any scale on joint transforms is ignored.

use bevy::math::{Quat, Vec3};
use bevy::transform::components::Transform;
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

/// bevy `Vec3` -> nalgebra `Vector3`.
pub fn vec_to_na(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

/// nalgebra `Vector3` -> bevy `Vec3`.
pub fn vec_from_na(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// bevy `Quat` -> nalgebra `UnitQuaternion`. Renormalizes.
pub fn quat_to_na(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// nalgebra `UnitQuaternion` -> bevy `Quat`.
pub fn quat_from_na(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Local `Transform` -> rigid isometry (translation + rotation, scale dropped).
pub fn transform_to_isometry(transform: &Transform) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::from(vec_to_na(transform.translation)),
        quat_to_na(transform.rotation),
    )
}

/// Rigid isometry -> local `Transform` with unit scale.
pub fn isometry_to_transform(iso: &Isometry3<f32>) -> Transform {
    Transform {
        translation: vec_from_na(&iso.translation.vector),
        rotation: quat_from_na(&iso.rotation),
        ..Transform::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
