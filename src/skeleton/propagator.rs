//! Hierarchical transform propagation
//!
//! Walks the bone tree pre-order, combining each bone's local pose with the
//! accumulated ancestor transform to produce model-space matrices and,
//! optionally, the final skinning matrices (`world * inverse_bind`).
//!
//! The walk is iterative with an explicit stack; deep rigs cannot overflow
//! the call stack. It is side-effect-free on the skeleton and only writes
//! into the caller-supplied palette, so the same skeleton can be propagated
//! concurrently for independent instances.

use glam::{Affine3A, Mat4};

use crate::animation::Pose;
use crate::skeleton::{BoneId, Skeleton};

/// Whether a propagation pass composes the inverse bind poses.
///
/// The pass feeding the IK solver must skip them: mid-solve the solver works
/// with model-space bone transforms, and bind-pose composition is
/// meaningless there. Only the final render-facing pass includes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skinning {
    Include,
    Skip,
}

/// Per-instance scratch buffers for one propagation pass.
///
/// Pre-sized to the skeleton's bone count and reused across frames; the
/// contents are derived state with no identity across updates.
#[derive(Debug, Clone)]
pub struct BonePalette {
    /// Accumulated ancestor transform per bone, before the bone's own local
    /// pose is applied. The IK solver needs this to re-derive a corrected
    /// local transform after rotating a bone in world space.
    pub parent_world: Vec<Affine3A>,
    /// Full model-space transform per bone.
    pub world: Vec<Affine3A>,
    /// `world * inverse_bind` per bone, consumed by the renderer. Only
    /// refreshed by [`Skinning::Include`] passes.
    pub skinning: Vec<Mat4>,
}

impl BonePalette {
    #[must_use]
    pub fn new(bone_count: usize) -> Self {
        Self {
            parent_world: vec![Affine3A::IDENTITY; bone_count],
            world: vec![Affine3A::IDENTITY; bone_count],
            skinning: vec![Mat4::IDENTITY; bone_count],
        }
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.world.len()
    }
}

/// Propagates the whole skeleton from the root.
///
/// Bones without a pose entry fall back to their static bind-pose local
/// transform (structural nodes that no clip animates).
pub fn propagate(skeleton: &Skeleton, pose: &Pose, palette: &mut BonePalette, skinning: Skinning) {
    walk(skeleton, pose, palette, skeleton.root(), Affine3A::IDENTITY, skinning);
}

/// Re-propagates the subtree rooted at `subtree_root`, reusing the
/// `parent_world` entry recorded by the last pass over its ancestors.
///
/// This is the IK inner-loop refresh; it never computes skinning matrices.
pub fn propagate_subtree(
    skeleton: &Skeleton,
    pose: &Pose,
    palette: &mut BonePalette,
    subtree_root: BoneId,
) {
    let parent_acc = palette.parent_world[subtree_root.index()];
    walk(skeleton, pose, palette, subtree_root, parent_acc, Skinning::Skip);
}

fn walk(
    skeleton: &Skeleton,
    pose: &Pose,
    palette: &mut BonePalette,
    start: BoneId,
    start_parent: Affine3A,
    skinning: Skinning,
) {
    let mut stack: Vec<(BoneId, Affine3A)> = Vec::with_capacity(32);
    stack.push((start, start_parent));

    while let Some((id, parent_acc)) = stack.pop() {
        let bone = skeleton.bone(id);
        let local = pose.get(id).copied().unwrap_or(bone.local_bind);

        let world = parent_acc * local.to_affine();
        palette.parent_world[id.index()] = parent_acc;
        palette.world[id.index()] = world;
        if skinning == Skinning::Include {
            palette.skinning[id.index()] = Mat4::from(world * bone.inverse_bind);
        }

        for &child in bone.children.iter().rev() {
            stack.push((child, world));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Sqt;
    use glam::Vec3;

    fn two_bone_skeleton() -> Skeleton {
        let mut builder = Skeleton::builder("rig");
        let root = builder
            .root("root", Sqt::from_translation(Vec3::new(1.0, 0.0, 0.0)), Affine3A::IDENTITY)
            .unwrap();
        builder
            .bone("child", root, Sqt::from_translation(Vec3::new(0.0, 1.0, 0.0)), Affine3A::IDENTITY)
            .unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn child_world_accumulates_parent() {
        let skeleton = two_bone_skeleton();
        let pose = Pose::new(skeleton.bone_count());
        let mut palette = BonePalette::new(skeleton.bone_count());

        propagate(&skeleton, &pose, &mut palette, Skinning::Skip);

        let child = skeleton.bone_id("child").unwrap();
        let pos = Vec3::from(palette.world[child.index()].translation);
        assert!((pos - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn parent_world_excludes_own_local() {
        let skeleton = two_bone_skeleton();
        let pose = Pose::new(skeleton.bone_count());
        let mut palette = BonePalette::new(skeleton.bone_count());

        propagate(&skeleton, &pose, &mut palette, Skinning::Skip);

        let child = skeleton.bone_id("child").unwrap();
        let acc = Vec3::from(palette.parent_world[child.index()].translation);
        assert!((acc - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
