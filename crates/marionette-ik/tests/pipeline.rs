//! End-to-end solve scenarios over a live bevy app.
//!
//! A four-joint chain rests pointing up (+Z, unit bones). Expected poses
//! are computed independently with the standalone solver and plain
//! quaternion math, then checked against the transforms the pipeline wrote
//! back.

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};

use marionette_core::types::{ChainPose, GoalPose, JointPose};
use marionette_ik::{ChainArena, FabrikSolver, IkEffector, IkSolver};
use marionette_test_utils::{ik_test_app, spawn_chain_rig, world_isometry};

/// The rest pose of [`spawn_chain_rig`] with unit spacing, as a chain pose.
fn rest_chain_pose(joints: usize) -> ChainPose {
    ChainPose::new(
        (0..joints)
            .map(|i| {
                JointPose::new(
                    Vector3::new(0.0, 0.0, i as f32),
                    UnitQuaternion::identity(),
                )
            })
            .collect(),
    )
}

#[test]
fn half_weight_lerp_lands_midway() {
    let mut app = ik_test_app();
    let rig = spawn_chain_rig(app.world_mut(), 4, 1.0);

    // Target 10 units off the rest end along +X; far out of reach, so the
    // solved pose is the chain laid out straight toward it.
    let target = Vector3::new(10.0, 0.0, 3.0);
    let mut effector = IkEffector::new()
        .with_chain_length(4)
        .with_target_position(target);
    effector.set_weight(0.5);
    app.world_mut().entity_mut(rig.end()).insert(effector);

    app.update();

    let rest = rest_chain_pose(4);
    let goal = GoalPose::new(target, UnitQuaternion::identity());
    let (solved, report) = FabrikSolver::with_defaults()
        .solve(&rest, &goal, false)
        .unwrap();
    assert!(!report.converged);

    // Each joint lands exactly midway between rest and solved.
    for (i, &joint) in rig.joints.iter().enumerate() {
        let position = world_isometry(app.world(), joint).translation.vector;
        let expected = rest[i].position.lerp(&solved[i].position, 0.5);
        assert_relative_eq!(position.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(position.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(position.z, expected.z, epsilon = 1e-4);
    }
}

#[test]
fn half_weight_nlerp_rotates_rest_pose_about_base() {
    let mut app = ik_test_app();
    let rig = spawn_chain_rig(app.world_mut(), 4, 1.0);

    let target = Vector3::new(10.0, 0.0, 3.0);
    let mut effector = IkEffector::new()
        .with_chain_length(4)
        .with_target_position(target);
    effector.set_weight(0.5);
    effector.enable_weighted_nlerp(true);
    app.world_mut().entity_mut(rig.end()).insert(effector);

    app.update();

    // The solved base orientation carries +Z onto the straightened chain
    // direction; at weight 0.5 the whole rest pose rotates about the base
    // by half that displacement.
    let direction = Vector3::new(10.0, 0.0, 3.0).normalize();
    let displacement = UnitQuaternion::rotation_between(&Vector3::z(), &direction).unwrap();
    let half = UnitQuaternion::identity()
        .try_slerp(&displacement, 0.5, 1.0e-6)
        .unwrap();

    for (i, &joint) in rig.joints.iter().enumerate() {
        let iso = world_isometry(app.world(), joint);
        let expected = half * Vector3::new(0.0, 0.0, i as f32);
        assert_relative_eq!(iso.translation.vector.x, expected.x, epsilon = 1e-4);
        assert_relative_eq!(iso.translation.vector.y, expected.y, epsilon = 1e-4);
        assert_relative_eq!(iso.translation.vector.z, expected.z, epsilon = 1e-4);
        // Bone lengths are preserved: no corner cutting.
        assert_relative_eq!(iso.translation.vector.norm(), i as f32, epsilon = 1e-4);
        // Rotations carry along with the base displacement.
        assert_relative_eq!(iso.rotation.angle_to(&half), 0.0, epsilon = 1e-4);
    }
}

#[test]
fn full_weight_matches_solved_pose() {
    let mut app = ik_test_app();
    let rig = spawn_chain_rig(app.world_mut(), 4, 1.0);

    let target = Vector3::new(1.5, 0.0, 1.5); // comfortably reachable
    app.world_mut().entity_mut(rig.end()).insert(
        IkEffector::new()
            .with_chain_length(4)
            .with_target_position(target),
    );

    app.update();

    let rest = rest_chain_pose(4);
    let goal = GoalPose::new(target, UnitQuaternion::identity());
    let (solved, report) = FabrikSolver::with_defaults()
        .solve(&rest, &goal, false)
        .unwrap();
    assert!(report.converged);

    for (i, &joint) in rig.joints.iter().enumerate() {
        let position = world_isometry(app.world(), joint).translation.vector;
        assert_relative_eq!(position.x, solved[i].position.x, epsilon = 1e-4);
        assert_relative_eq!(position.y, solved[i].position.y, epsilon = 1e-4);
        assert_relative_eq!(position.z, solved[i].position.z, epsilon = 1e-4);
    }
}

#[test]
fn rebinding_uses_only_the_second_bindings_parameters() {
    let mut app = ik_test_app();
    let rig_a = spawn_chain_rig(app.world_mut(), 4, 1.0);
    let rig_b = spawn_chain_rig(app.world_mut(), 3, 1.0);

    app.world_mut().entity_mut(rig_a.end()).insert(
        IkEffector::new()
            .with_chain_length(4)
            .with_target_position(Vector3::new(1.5, 0.0, 1.5)),
    );
    app.update();
    assert_eq!(app.world().resource::<ChainArena>().len(), 1);

    // Tear the effector off rig A and set up a shorter chain on rig B.
    app.world_mut()
        .entity_mut(rig_a.end())
        .remove::<IkEffector>();
    app.world_mut().entity_mut(rig_b.end()).insert(
        IkEffector::new()
            .with_chain_length(2)
            .with_target_position(Vector3::new(1.0, 0.0, 1.0)),
    );
    app.update();

    let arena = app.world().resource::<ChainArena>();
    assert_eq!(arena.len(), 1);
    let state = arena.iter().next().unwrap();
    assert_eq!(state.solver, rig_b.solver);
    assert_eq!(state.topology, vec![rig_b.joints[1], rig_b.joints[2]]);

    // The second binding solves with its own parameters: rig B's end
    // reaches its target from base joint 1.
    let position = world_isometry(app.world(), rig_b.end()).translation.vector;
    assert_relative_eq!(position.x, 1.0, epsilon = 1e-3);
    assert_relative_eq!(position.z, 1.0, epsilon = 1e-3);
}

#[test]
fn rotation_matching_carries_goal_rotation_to_the_end_joint() {
    let mut app = ik_test_app();
    let rig = spawn_chain_rig(app.world_mut(), 4, 1.0);
    app.world_mut()
        .entity_mut(rig.solver)
        .insert(IkSolver::new().with_target_rotation(true));

    let goal_rotation = UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0);
    let mut effector = IkEffector::new()
        .with_chain_length(4)
        .with_target_position(Vector3::new(1.0, 0.0, 2.0));
    effector.set_target_rotation(goal_rotation);
    effector.set_rotation_weight(1.0);
    effector.set_rotation_decay(1.0);
    app.world_mut().entity_mut(rig.end()).insert(effector);

    app.update();

    let iso = world_isometry(app.world(), rig.end());
    assert_relative_eq!(iso.rotation.angle_to(&goal_rotation), 0.0, epsilon = 1e-4);
}
