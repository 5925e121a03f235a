//! CCD Inverse Kinematics Tests
//!
//! Tests for:
//! - Target resolution in global and instance-local space
//! - Convergence on reachable targets
//! - Bounded effort on unreachable or degenerate targets
//! - Chain truncation at the skeleton root
//! - Full-instance integration through IK attachments

use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3};

use marionette::{
    BonePalette, IK_DISTANCE_TOLERANCE, IkAttachment, IkTarget, Pose, Skeleton, SkinnedInstance,
    Skinning, Sqt, propagate, solve_ccd,
};

const EPSILON: f32 = 1e-4;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

/// Makes the solver's `log::trace!` diagnostics visible under
/// `RUST_LOG=trace`.
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// root at origin, elbow one unit along +X, hand one unit further. Total
/// reach from the elbow is 1, from the root 2.
fn arm_skeleton() -> Skeleton {
    let along_x = Sqt::from_translation(Vec3::X);
    let mut builder = Skeleton::builder("arm");
    let root = builder
        .root("root", Sqt::IDENTITY, Affine3A::IDENTITY)
        .unwrap();
    let elbow = builder
        .bone("elbow", root, along_x, Affine3A::from_translation(-Vec3::X))
        .unwrap();
    builder
        .bone("hand", elbow, along_x, Affine3A::from_translation(Vec3::X * -2.0))
        .unwrap();
    builder.finish().unwrap()
}

fn propagated(skeleton: &Skeleton, pose: &Pose) -> BonePalette {
    let mut palette = BonePalette::new(skeleton.bone_count());
    propagate(skeleton, pose, &mut palette, Skinning::Skip);
    palette
}

fn hand_world(skeleton: &Skeleton, palette: &BonePalette) -> Vec3 {
    let hand = skeleton.bone_id("hand").unwrap();
    palette.world[hand.index()].translation.into()
}

// ============================================================================
// Target resolution
// ============================================================================

#[test]
fn global_target_ignores_instance_transform() {
    let instance_world = Affine3A::from_translation(Vec3::new(100.0, 0.0, 0.0));
    let target = IkTarget::Global(Vec3::new(1.0, 2.0, 3.0));
    assert!(approx_vec3(target.resolve(&instance_world), Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn local_target_follows_instance_transform() {
    let instance_world = Affine3A::from_translation(Vec3::new(100.0, 0.0, 0.0));
    let target = IkTarget::Local(Vec3::new(1.0, 2.0, 3.0));
    assert!(approx_vec3(target.resolve(&instance_world), Vec3::new(101.0, 2.0, 3.0)));
}

#[test]
fn target_translation_moves_the_stored_point() {
    let mut target = IkTarget::Local(Vec3::ZERO);
    target.translate(Vec3::new(0.0, 0.5, 0.0));
    target.translate(Vec3::new(0.0, 0.5, 0.0));
    assert!(approx_vec3(target.resolve(&Affine3A::IDENTITY), Vec3::Y));
}

// ============================================================================
// Solver behavior
// ============================================================================

#[test]
fn reachable_target_converges() {
    init_logs();
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // One unit up from the elbow: a single 90-degree bend reaches it.
    let target = Vec3::new(1.0, 1.0, 0.0);
    let outcome = solve_ccd(
        &skeleton,
        hand,
        3,
        target,
        50,
        &Affine3A::IDENTITY,
        &mut pose,
        &mut palette,
    );

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    assert!(approx_vec3(hand_world(&skeleton, &palette), target));
}

#[test]
fn bent_chain_straightens_toward_distant_target() {
    let skeleton = arm_skeleton();
    let elbow = skeleton.bone_id("elbow").unwrap();
    let hand = skeleton.bone_id("hand").unwrap();

    // Start with the forearm folded 90 degrees up.
    let mut pose = Pose::new(skeleton.bone_count());
    pose.set(
        elbow,
        Sqt::new(Vec3::X, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), Vec3::ONE),
    );
    let mut palette = propagated(&skeleton, &pose);
    assert!(approx_vec3(hand_world(&skeleton, &palette), Vec3::new(1.0, 1.0, 0.0)));

    let target = Vec3::new(2.0, 0.0, 0.0);
    let outcome = solve_ccd(
        &skeleton,
        hand,
        2,
        target,
        50,
        &Affine3A::IDENTITY,
        &mut pose,
        &mut palette,
    );

    assert!(outcome.converged);
    assert!(approx_vec3(hand_world(&skeleton, &palette), target));
}

#[test]
fn unreachable_target_exhausts_budget_without_diverging() {
    init_logs();
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // Far out along the arm's own direction: every joint is already
    // aligned with the target, so no rotation is ever applied.
    let target = Vec3::new(10.0, 0.0, 0.0);
    let outcome = solve_ccd(
        &skeleton,
        hand,
        3,
        target,
        10,
        &Affine3A::IDENTITY,
        &mut pose,
        &mut palette,
    );

    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 10);
    assert!(approx_vec3(hand_world(&skeleton, &palette), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn target_within_tolerance_is_a_no_op() {
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // Inside the squared-distance tolerance of the rest position.
    let target = Vec3::new(2.0, 0.05, 0.0);
    assert!(target.distance_squared(Vec3::new(2.0, 0.0, 0.0)) <= IK_DISTANCE_TOLERANCE);

    let outcome = solve_ccd(
        &skeleton,
        hand,
        3,
        target,
        50,
        &Affine3A::IDENTITY,
        &mut pose,
        &mut palette,
    );

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 0);
    assert!(pose.get(hand).is_none(), "no rotation should be written");
}

#[test]
fn chain_truncates_at_the_skeleton_root() {
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // Asking for more bones than exist solves with what is there.
    let target = Vec3::new(1.0, 1.0, 0.0);
    let outcome = solve_ccd(
        &skeleton,
        hand,
        10,
        target,
        50,
        &Affine3A::IDENTITY,
        &mut pose,
        &mut palette,
    );

    assert!(outcome.converged);
    assert!(approx_vec3(hand_world(&skeleton, &palette), target));
}

#[test]
fn single_bone_chain_has_nothing_to_rotate() {
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    for chain_length in [0, 1] {
        let outcome = solve_ccd(
            &skeleton,
            hand,
            chain_length,
            Vec3::new(1.0, 1.0, 0.0),
            50,
            &Affine3A::IDENTITY,
            &mut pose,
            &mut palette,
        );
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }
}

#[test]
fn degenerate_chain_still_reports_an_on_target_effector() {
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // The effector already rests on the target; even with nothing to
    // rotate the outcome should say so.
    for chain_length in [0, 1] {
        let outcome = solve_ccd(
            &skeleton,
            hand,
            chain_length,
            Vec3::new(2.0, 0.0, 0.0),
            50,
            &Affine3A::IDENTITY,
            &mut pose,
            &mut palette,
        );
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }
}

#[test]
fn instance_transform_is_factored_out_of_the_solve() {
    let skeleton = arm_skeleton();
    let mut pose = Pose::new(skeleton.bone_count());
    let mut palette = propagated(&skeleton, &pose);
    let hand = skeleton.bone_id("hand").unwrap();

    // The instance is moved and rotated; the target is world-space and the
    // solve must account for the placement.
    let instance_world = Affine3A::from_rotation_translation(
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(5.0, 0.0, 0.0),
    );
    // Rest effector sits at instance * (2,0,0) = (5,2,0); aim one unit -X.
    let target = Vec3::new(4.0, 1.0, 0.0);

    let outcome = solve_ccd(
        &skeleton,
        hand,
        3,
        target,
        50,
        &instance_world,
        &mut pose,
        &mut palette,
    );

    assert!(outcome.converged);
    let world = instance_world * palette.world[hand.index()];
    assert!(approx_vec3(world.translation.into(), target));
}

// ============================================================================
// Instance integration
// ============================================================================

#[test]
fn attached_ik_drives_the_bone_during_update() {
    init_logs();
    let skeleton = Arc::new(arm_skeleton());
    let mut instance = SkinnedInstance::new(skeleton, None, Sqt::IDENTITY);

    let target = Vec3::new(1.0, 1.0, 0.0);
    instance.attach_ik("hand", IkAttachment::new(IkTarget::Global(target), 3, 50));
    instance.update(1.0 / 60.0);

    let hand = instance.bone_world_transform("hand").unwrap();
    assert!(approx_vec3(hand.translation, target));
    assert!(instance.ik("hand").is_some());
}

#[test]
fn detached_ik_releases_the_bone() {
    let skeleton = Arc::new(arm_skeleton());
    let mut instance = SkinnedInstance::new(skeleton, None, Sqt::IDENTITY);

    instance.attach_ik(
        "hand",
        IkAttachment::new(IkTarget::Global(Vec3::new(1.0, 1.0, 0.0)), 3, 50),
    );
    instance.update(1.0 / 60.0);
    instance.detach_ik("hand");
    assert!(instance.ik("hand").is_none());

    // The pose keeps its last IK result; detaching only stops solving.
    instance.update(1.0 / 60.0);
    let hand = instance.bone_world_transform("hand").unwrap();
    assert!(approx_vec3(hand.translation, Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn ik_target_can_be_steered_between_updates() {
    let skeleton = Arc::new(arm_skeleton());
    let mut instance = SkinnedInstance::new(skeleton, None, Sqt::IDENTITY);

    instance.attach_ik(
        "hand",
        IkAttachment::new(IkTarget::Global(Vec3::new(1.0, 1.0, 0.0)), 3, 50),
    );
    instance.update(1.0 / 60.0);

    instance
        .ik_mut("hand")
        .unwrap()
        .move_target(Vec3::new(0.0, -2.0, 0.0));
    instance.update(1.0 / 60.0);

    let hand = instance.bone_world_transform("hand").unwrap();
    assert!(approx_vec3(hand.translation, Vec3::new(1.0, -1.0, 0.0)));
}
