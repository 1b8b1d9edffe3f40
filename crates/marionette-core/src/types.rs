use bevy::ecs::entity::Entity;
use nalgebra::{UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Poses
// ---------------------------------------------------------------------------

/// World-space position/orientation pair for a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl JointPose {
    pub const fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Pose at the origin with no rotation.
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl Default for JointPose {
    fn default() -> Self {
        Self::identity()
    }
}

/// The goal pose an effector hands to its solver each pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalPose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl GoalPose {
    pub const fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }
}

/// Ordered world-space poses for one chain.
///
/// Index 0 is the chain base; the last index is the end joint (the joint the
/// effector is attached to).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainPose {
    joints: Vec<JointPose>,
}

impl ChainPose {
    pub const fn new(joints: Vec<JointPose>) -> Self {
        Self { joints }
    }

    /// Identity-filled pose buffer for `len` joints.
    pub fn with_len(len: usize) -> Self {
        Self {
            joints: vec![JointPose::identity(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[JointPose] {
        &self.joints
    }

    pub fn joints_mut(&mut self) -> &mut [JointPose] {
        &mut self.joints
    }

    pub fn push(&mut self, pose: JointPose) {
        self.joints.push(pose);
    }

    pub fn clear(&mut self) {
        self.joints.clear();
    }

    /// Base joint pose, if the chain is non-empty.
    pub fn base(&self) -> Option<&JointPose> {
        self.joints.first()
    }

    /// End joint pose, if the chain is non-empty.
    pub fn end(&self) -> Option<&JointPose> {
        self.joints.last()
    }
}

impl std::ops::Index<usize> for ChainPose {
    type Output = JointPose;
    fn index(&self, i: usize) -> &JointPose {
        &self.joints[i]
    }
}

impl std::ops::IndexMut<usize> for ChainPose {
    fn index_mut(&mut self, i: usize) -> &mut JointPose {
        &mut self.joints[i]
    }
}

impl From<Vec<JointPose>> for ChainPose {
    fn from(joints: Vec<JointPose>) -> Self {
        Self::new(joints)
    }
}

// ---------------------------------------------------------------------------
// Entity handles
// ---------------------------------------------------------------------------

/// Handle to an entity carrying an IK effector component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectorHandle(pub Entity);

/// Handle to an entity carrying an IK solver component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolverHandle(pub Entity);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
