//! Cyclic-Coordinate-Descent inverse kinematics
//!
//! The solver bends a chain of bones (the effector plus up to
//! `chain_length - 1` ancestors) so the effector's world position reaches a
//! target point. It is a best-effort solver: it stops as soon as the
//! effector is within tolerance, or after `max_tries` rotation attempts,
//! whichever comes first. A near-miss after exhausting the budget is an
//! accepted outcome, not an error.
//!
//! The solve runs in world space. After every applied rotation the joint's
//! corrected transform is converted back through model space into its own
//! parent-relative space and written into the working pose, then the
//! joint's subtree is re-propagated so the next iteration reads fresh
//! positions. The skinning composition is skipped throughout; only the
//! final full propagation pass produces renderer-facing matrices.

use glam::{Affine3A, Vec3};
use smallvec::SmallVec;

use crate::animation::Pose;
use crate::math::Sqt;
use crate::skeleton::{BoneId, BonePalette, Skeleton, propagate_subtree};

/// Squared-distance tolerance at which the effector counts as on target.
pub const IK_DISTANCE_TOLERANCE: f32 = 0.01;

/// Directions closer than this to parallel skip the rotation; the cross
/// product would yield a degenerate axis.
const ALIGNMENT_THRESHOLD: f32 = 0.999_99;

/// Where an IK target lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IkTarget {
    /// An absolute world-space point, e.g. tracking another object.
    Global(Vec3),
    /// A point relative to the owning instance, re-applied through the
    /// instance's world transform every frame (weapon swings and other
    /// self-relative motion).
    Local(Vec3),
}

impl IkTarget {
    /// Resolves to a single absolute world position for this frame.
    #[must_use]
    pub fn resolve(&self, instance_world: &Affine3A) -> Vec3 {
        match *self {
            Self::Global(point) => point,
            Self::Local(point) => instance_world.transform_point3(point),
        }
    }

    /// Translates the stored point by `delta`, in whichever space the
    /// target is expressed.
    pub fn translate(&mut self, delta: Vec3) {
        match self {
            Self::Global(point) | Self::Local(point) => *point += delta,
        }
    }
}

/// One IK influence on a named effector bone. At most one attachment per
/// bone name; re-attaching replaces.
#[derive(Debug, Clone)]
pub struct IkAttachment {
    pub target: IkTarget,
    /// Number of bones in the chain, effector included.
    pub chain_length: u32,
    /// Budget of rotation attempts across the whole chain per solve.
    pub max_tries: u32,
}

impl IkAttachment {
    #[must_use]
    pub const fn new(target: IkTarget, chain_length: u32, max_tries: u32) -> Self {
        Self {
            target,
            chain_length,
            max_tries,
        }
    }

    /// Moves the target by `delta` in its own space.
    pub fn move_target(&mut self, delta: Vec3) {
        self.target.translate(delta);
    }
}

/// What a solve did, for diagnostics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcdOutcome {
    /// Rotation attempts consumed.
    pub iterations: u32,
    /// Whether the effector ended within tolerance of the target.
    pub converged: bool,
}

/// Bends the chain ending at `effector` toward `target` (world space).
///
/// Expects `palette` to hold a current skinning-free propagation of `pose`;
/// chain-local entries are refreshed in place as the solve progresses. A
/// chain that reaches the skeleton root before `chain_length` bones is
/// solved with the bones actually available.
pub fn solve_ccd(
    skeleton: &Skeleton,
    effector: BoneId,
    chain_length: u32,
    target: Vec3,
    max_tries: u32,
    instance_world: &Affine3A,
    pose: &mut Pose,
    palette: &mut BonePalette,
) -> CcdOutcome {
    // Converged may hold from the start; the early exits below must still
    // report it correctly.
    let effector_world = *instance_world * palette.world[effector.index()];
    let mut outcome = CcdOutcome {
        iterations: 0,
        converged: Vec3::from(effector_world.translation).distance_squared(target)
            <= IK_DISTANCE_TOLERANCE,
    };
    if chain_length == 0 || outcome.converged {
        return outcome;
    }

    // Chain from the effector up; the bone arena is not stored in
    // hierarchical order, so parent links are followed explicitly.
    let mut chain: SmallVec<[BoneId; 8]> = SmallVec::new();
    let mut current = effector;
    chain.push(current);
    while (chain.len() as u32) < chain_length {
        match skeleton.bone(current).parent {
            Some(parent) => {
                chain.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    if chain.len() < 2 {
        // Nothing above the effector to rotate.
        return outcome;
    }

    let world_sqt = |palette: &BonePalette, id: BoneId| {
        Sqt::from_affine(&(*instance_world * palette.world[id.index()]))
    };
    let mut chain_world: SmallVec<[Sqt; 8]> =
        chain.iter().map(|&id| world_sqt(palette, id)).collect();

    if log::log_enabled!(log::Level::Trace) {
        let reach: f32 = chain_world
            .windows(2)
            .map(|w| w[0].translation.distance(w[1].translation))
            .sum();
        log::trace!(
            "ccd solve: effector {:?}, {} bones, reach {:.3}",
            effector,
            chain.len(),
            reach
        );
    }

    let inverse_instance = instance_world.inverse();
    // The joint nearest the effector rotates first; the cursor cycles
    // through the chain, always skipping index 0 (the effector itself).
    let mut cursor = 1;

    while outcome.iterations < max_tries {
        let effector_pos = chain_world[0].translation;
        if effector_pos.distance_squared(target) <= IK_DISTANCE_TOLERANCE {
            outcome.converged = true;
            return outcome;
        }

        let joint_pos = chain_world[cursor].translation;
        let to_effector = (effector_pos - joint_pos).normalize_or_zero();
        let to_target = (target - joint_pos).normalize_or_zero();

        if to_effector != Vec3::ZERO && to_target != Vec3::ZERO {
            let cos_angle = to_effector.dot(to_target).clamp(-1.0, 1.0);
            if cos_angle < ALIGNMENT_THRESHOLD {
                let axis = to_effector.cross(to_target);
                if axis.length_squared() > f32::EPSILON {
                    let angle = cos_angle.acos();
                    chain_world[cursor].rotate_about_self(angle, axis);

                    // World -> model -> parent-relative, then write back.
                    let joint = chain[cursor];
                    let model = inverse_instance * chain_world[cursor].to_affine();
                    let local = palette.parent_world[joint.index()].inverse() * model;
                    pose.set(joint, Sqt::from_affine(&local));

                    propagate_subtree(skeleton, pose, palette, joint);
                    for (slot, &id) in chain_world.iter_mut().zip(chain.iter()) {
                        *slot = world_sqt(palette, id);
                    }
                }
            }
        }

        outcome.iterations += 1;
        cursor += 1;
        if cursor >= chain.len() {
            cursor = 1;
        }
    }

    outcome.converged =
        chain_world[0].translation.distance_squared(target) <= IK_DISTANCE_TOLERANCE;
    outcome
}
