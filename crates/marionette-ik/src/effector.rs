//! The per-chain goal descriptor component.

use bevy::ecs::entity::Entity;
use bevy::prelude::Component;
use nalgebra::{UnitQuaternion, Vector3};

use crate::binding::ChainSlot;

/// Back reference from an effector to its owning solver plus the arena slot
/// holding the chain's numeric state. Established exclusively by
/// [`binding::bind`](crate::binding::bind).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub solver: Entity,
    pub slot: ChainSlot,
}

/// End-of-chain goal descriptor: target pose plus blending parameters.
///
/// Lives on the end joint of a chain. The chain is solved such that this
/// joint moves toward the target. The target comes from a scene node
/// reference when one is set, otherwise from the cached position/rotation
/// pair.
///
/// Don't target a node that is part of the chain being solved; the
/// resulting feedback loop produces garbage poses.
#[derive(Component, Debug, Clone)]
pub struct IkEffector {
    target_node: Option<Entity>,
    target_name: Option<String>,
    target_position: Vector3<f32>,
    target_rotation: UnitQuaternion<f32>,
    chain_length: u32,
    weight: f32,
    rotation_weight: f32,
    rotation_decay: f32,
    weighted_nlerp: bool,
    inherit_parent_rotation: bool,
    binding: Option<Binding>,
    topology_dirty: bool,
}

impl Default for IkEffector {
    fn default() -> Self {
        Self {
            target_node: None,
            target_name: None,
            target_position: Vector3::zeros(),
            target_rotation: UnitQuaternion::identity(),
            chain_length: 0,
            weight: 1.0,
            rotation_weight: 1.0,
            rotation_decay: 0.25,
            weighted_nlerp: false,
            inherit_parent_rotation: false,
            binding: None,
            topology_dirty: false,
        }
    }
}

impl IkEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the chain length.
    pub fn with_chain_length(mut self, chain_length: u32) -> Self {
        self.set_chain_length(chain_length);
        self
    }

    /// Builder: set the position weight.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.set_weight(weight);
        self
    }

    /// Builder: set the cached target position.
    pub fn with_target_position(mut self, position: Vector3<f32>) -> Self {
        self.set_target_position(position);
        self
    }

    // -- target --

    /// The node currently used as a target. `None` when the effector runs
    /// off its cached pose (or has lost its referent).
    pub fn target(&self) -> Option<Entity> {
        self.target_node
    }

    /// Set or clear the target node.
    ///
    /// While a node is set, its world pose is the authoritative goal and
    /// cached-pose writes are ignored. Clearing the node makes the cached
    /// pose authoritative again. Either way any pending name binding is
    /// dropped.
    pub fn set_target(&mut self, node: Option<Entity>) {
        self.target_node = node;
        self.target_name = None;
    }

    /// Pending target-name binding, if any.
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Request late binding to a node by name. The node does not have to
    /// exist yet; the first node carrying a matching `Name` is adopted as
    /// the target. This clears the existing target node.
    pub fn set_target_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.target_node = None;
        self.target_name = if name.is_empty() { None } else { Some(name) };
    }

    /// Cached target position, in world space.
    pub fn target_position(&self) -> Vector3<f32> {
        self.target_position
    }

    /// Set the cached target position. No effect while a target node is set.
    pub fn set_target_position(&mut self, position: Vector3<f32>) {
        if self.target_node.is_none() {
            self.target_position = position;
        }
    }

    /// Cached target rotation, in world space.
    pub fn target_rotation(&self) -> UnitQuaternion<f32> {
        self.target_rotation
    }

    /// Set the cached target rotation. No effect while a target node is set.
    pub fn set_target_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        if self.target_node.is_none() {
            self.target_rotation = rotation;
        }
    }

    /// Cached target rotation as (roll, pitch, yaw) radians.
    ///
    /// Euler conversion is lossy near gimbal lock (pitch approaching ±90°);
    /// away from it the round trip holds to floating tolerance.
    pub fn target_rotation_euler(&self) -> (f32, f32, f32) {
        self.target_rotation.euler_angles()
    }

    /// Set the cached target rotation from (roll, pitch, yaw) radians.
    /// No effect while a target node is set.
    pub fn set_target_rotation_euler(&mut self, roll: f32, pitch: f32, yaw: f32) {
        self.set_target_rotation(UnitQuaternion::from_euler_angles(roll, pitch, yaw));
    }

    // -- chain shape --

    /// Number of joints affected by this effector. 0 means every joint
    /// between the effector and the owning solver's boundary.
    pub fn chain_length(&self) -> u32 {
        self.chain_length
    }

    /// Set the chain joint count. 0 extends to the solver boundary; a value
    /// deeper than the hierarchy is clamped there at resolution time.
    pub fn set_chain_length(&mut self, chain_length: u32) {
        if self.chain_length != chain_length {
            self.chain_length = chain_length;
            self.topology_dirty = true;
        }
    }

    // -- blending parameters --

    /// How strongly the solved pose replaces the pre-solve pose.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set the solved-vs-initial blend fraction, clamped to [0, 1].
    ///
    /// Intermediate values transition smoothly between the two poses, e.g.
    /// lifting a foot off the ground or letting go of an object.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.clamp(0.0, 1.0);
    }

    /// How strongly the target rotation influences the base joint.
    pub fn rotation_weight(&self) -> f32 {
        self.rotation_weight
    }

    /// Set the target-rotation influence, clamped to [0, 1]. Only takes
    /// effect when the owning solver has target-rotation matching enabled.
    pub fn set_rotation_weight(&mut self, weight: f32) {
        self.rotation_weight = weight.clamp(0.0, 1.0);
    }

    /// Per-joint falloff factor of the rotation weight.
    pub fn rotation_decay(&self) -> f32 {
        self.rotation_decay
    }

    /// Set the rotation-weight falloff, clamped to [0, 1].
    ///
    /// With decay 0.5 and rotation weight 1, the base joint matches the
    /// target rotation fully, the next joint 50%, then 25%, and so on down
    /// the chain. Makes long chains look natural when matching a rotation.
    pub fn set_rotation_decay(&mut self, decay: f32) {
        self.rotation_decay = decay.clamp(0.0, 1.0);
    }

    /// Whether intermediate weights blend rotationally about the chain base.
    pub fn weighted_nlerp_enabled(&self) -> bool {
        self.weighted_nlerp
    }

    /// For weights strictly between 0 and 1 the default is to lerp each
    /// joint position, which visibly cuts corners when the solved and
    /// initial poses are far apart on a rotating limb. Enabling this blends
    /// as a rotation about the chain's base joint instead.
    pub fn enable_weighted_nlerp(&mut self, enable: bool) {
        self.weighted_nlerp = enable;
    }

    /// Whether the base joint re-derives its pre-solve rotation from its
    /// parent each pass.
    pub fn inherit_parent_rotation_enabled(&self) -> bool {
        self.inherit_parent_rotation
    }

    pub fn enable_inherit_parent_rotation(&mut self, enable: bool) {
        self.inherit_parent_rotation = enable;
    }

    // -- binding (read side) --

    /// The owning solver entity, if bound.
    pub fn solver(&self) -> Option<Entity> {
        self.binding.map(|binding| binding.solver)
    }

    // -- crate-internal surface (binding/plugin only) --

    pub(crate) fn binding(&self) -> Option<Binding> {
        self.binding
    }

    pub(crate) fn set_binding(&mut self, binding: Option<Binding>) {
        self.binding = binding;
    }

    /// Adopt a node found for the pending target name.
    pub(crate) fn adopt_target(&mut self, node: Entity) {
        self.target_node = Some(node);
        self.target_name = None;
    }

    pub(crate) fn topology_dirty(&self) -> bool {
        self.topology_dirty
    }

    pub(crate) fn clear_topology_dirty(&mut self) {
        self.topology_dirty = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::ecs::world::World;

    fn some_entity() -> Entity {
        World::new().spawn_empty().id()
    }

    // ---- weights ----

    #[test]
    fn weights_clamp_to_unit_interval() {
        let mut effector = IkEffector::new();
        effector.set_weight(2.0);
        assert_relative_eq!(effector.weight(), 1.0);
        effector.set_weight(-0.5);
        assert_relative_eq!(effector.weight(), 0.0);

        effector.set_rotation_weight(1.5);
        assert_relative_eq!(effector.rotation_weight(), 1.0);
        effector.set_rotation_weight(-1.0);
        assert_relative_eq!(effector.rotation_weight(), 0.0);

        effector.set_rotation_decay(7.0);
        assert_relative_eq!(effector.rotation_decay(), 1.0);
        effector.set_rotation_decay(-7.0);
        assert_relative_eq!(effector.rotation_decay(), 0.0);
    }

    #[test]
    fn in_range_weights_pass_through() {
        let mut effector = IkEffector::new();
        effector.set_weight(0.25);
        effector.set_rotation_weight(0.5);
        effector.set_rotation_decay(0.75);
        assert_relative_eq!(effector.weight(), 0.25);
        assert_relative_eq!(effector.rotation_weight(), 0.5);
        assert_relative_eq!(effector.rotation_decay(), 0.75);
    }

    // ---- target precedence ----

    #[test]
    fn cached_pose_writes_ignored_while_node_set() {
        let mut effector = IkEffector::new();
        effector.set_target_position(Vector3::new(1.0, 2.0, 3.0));
        effector.set_target(Some(some_entity()));

        // Neither write may corrupt the cached fields.
        effector.set_target_position(Vector3::new(9.0, 9.0, 9.0));
        effector.set_target_rotation(UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0));

        effector.set_target(None);
        assert_relative_eq!(effector.target_position().x, 1.0);
        assert_relative_eq!(effector.target_rotation().angle(), 0.0);
    }

    #[test]
    fn clearing_node_restores_cached_pose_writes() {
        let mut effector = IkEffector::new();
        effector.set_target(Some(some_entity()));
        effector.set_target(None);
        effector.set_target_position(Vector3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(effector.target_position().x, 4.0);
    }

    #[test]
    fn target_name_clears_node_reference() {
        let mut effector = IkEffector::new();
        effector.set_target(Some(some_entity()));
        effector.set_target_name("hand_target");
        assert_eq!(effector.target(), None);
        assert_eq!(effector.target_name(), Some("hand_target"));
    }

    #[test]
    fn set_target_clears_pending_name() {
        let mut effector = IkEffector::new();
        effector.set_target_name("foo");
        effector.set_target(Some(some_entity()));
        assert_eq!(effector.target_name(), None);
    }

    #[test]
    fn empty_target_name_clears_pending() {
        let mut effector = IkEffector::new();
        effector.set_target_name("foo");
        effector.set_target_name("");
        assert_eq!(effector.target_name(), None);
        assert_eq!(effector.target(), None);
    }

    #[test]
    fn adopt_target_consumes_pending_name() {
        let mut effector = IkEffector::new();
        effector.set_target_name("foo");
        let node = some_entity();
        effector.adopt_target(node);
        assert_eq!(effector.target(), Some(node));
        assert_eq!(effector.target_name(), None);
    }

    // ---- euler conversions ----

    #[test]
    fn euler_roundtrip_away_from_gimbal_lock() {
        let cases = [
            (0.3, 0.4, 0.5),
            (-1.0, 0.8, 2.0),
            (0.0, 0.0, std::f32::consts::FRAC_PI_2),
            (2.5, -1.2, -2.8),
        ];
        for (roll, pitch, yaw) in cases {
            let mut effector = IkEffector::new();
            effector.set_target_rotation_euler(roll, pitch, yaw);
            let (r, p, y) = effector.target_rotation_euler();
            assert_relative_eq!(r, roll, epsilon = 1e-4);
            assert_relative_eq!(p, pitch, epsilon = 1e-4);
            assert_relative_eq!(y, yaw, epsilon = 1e-4);
        }
    }

    #[test]
    fn euler_axis_aligned_is_exact_rotation() {
        let mut effector = IkEffector::new();
        effector.set_target_rotation_euler(0.0, 0.0, std::f32::consts::FRAC_PI_2);
        let rotated = effector.target_rotation() * Vector3::x();
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-6);
    }

    // ---- chain length ----

    #[test]
    fn chain_length_write_marks_topology_dirty() {
        let mut effector = IkEffector::new();
        assert!(!effector.topology_dirty());
        effector.set_chain_length(3);
        assert!(effector.topology_dirty());

        effector.clear_topology_dirty();
        effector.set_chain_length(3); // unchanged value
        assert!(!effector.topology_dirty());
    }

    #[test]
    fn defaults_match_component_docs() {
        let effector = IkEffector::new();
        assert_eq!(effector.chain_length(), 0);
        assert_relative_eq!(effector.weight(), 1.0);
        assert_relative_eq!(effector.rotation_weight(), 1.0);
        assert_relative_eq!(effector.rotation_decay(), 0.25);
        assert!(!effector.weighted_nlerp_enabled());
        assert!(!effector.inherit_parent_rotation_enabled());
        assert_eq!(effector.solver(), None);
    }
}
