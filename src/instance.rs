//! Per-character animation state
//!
//! A [`SkinnedInstance`] owns everything that is mutable per character:
//! playback queue, working pose, transform palette and IK attachments. The
//! skeleton and clip set stay immutable and `Arc`-shared across every
//! instance of the same model, so independently-owned instances can be
//! updated in parallel by a host without coordination.
//!
//! Per-frame ordering inside [`SkinnedInstance::update`]:
//! 1. advance the animation player into the working pose;
//! 2. if any IK attachment is active, propagate once with skinning skipped
//!    (CCD's starting point);
//! 3. solve every attachment, each mutating the shared pose;
//! 4. propagate a final time, producing the skinning matrices.
//!
//! Without active attachments only the final pass runs; the two-phase
//! contract replaces any hidden "already calculated" flag tied to call
//! order.

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::animation::{AnimationPlayer, AnimationSet, Pose};
use crate::errors::{MarionetteError, Result};
use crate::ik::{IkAttachment, solve_ccd};
use crate::math::Sqt;
use crate::skeleton::{BonePalette, Skeleton, Skinning, propagate};

/// One animated character: a transformable instance of a shared model.
#[derive(Debug)]
pub struct SkinnedInstance {
    skeleton: Arc<Skeleton>,
    animations: Option<Arc<AnimationSet>>,
    /// Placement of the instance in the world, applied on top of the
    /// skeleton's model space.
    pub transform: Sqt,
    player: AnimationPlayer,
    pose: Pose,
    palette: BonePalette,
    iks: FxHashMap<String, IkAttachment>,
}

impl SkinnedInstance {
    /// Creates an instance. A model without clips poses from the bind pose
    /// and ignores playback requests.
    #[must_use]
    pub fn new(
        skeleton: Arc<Skeleton>,
        animations: Option<Arc<AnimationSet>>,
        transform: Sqt,
    ) -> Self {
        let bone_count = skeleton.bone_count();
        let pose = if animations.is_some() {
            Pose::new(bone_count)
        } else {
            Pose::from_bind(&skeleton)
        };
        Self {
            palette: BonePalette::new(bone_count),
            pose,
            skeleton,
            animations,
            transform,
            player: AnimationPlayer::default(),
            iks: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Advances animation and IK by `dt` seconds and refreshes the
    /// skinning matrices.
    pub fn update(&mut self, dt: f32) {
        if let Some(set) = &self.animations {
            self.player.update(dt, set, &mut self.pose);
        }

        if !self.iks.is_empty() {
            let instance_world = self.transform.to_affine();
            // Phase 1: world transforms only, as CCD input.
            propagate(&self.skeleton, &self.pose, &mut self.palette, Skinning::Skip);

            for (bone_name, ik) in &self.iks {
                match self.skeleton.bone_id(bone_name) {
                    Ok(effector) => {
                        let target = ik.target.resolve(&instance_world);
                        let outcome = solve_ccd(
                            &self.skeleton,
                            effector,
                            ik.chain_length,
                            target,
                            ik.max_tries,
                            &instance_world,
                            &mut self.pose,
                            &mut self.palette,
                        );
                        log::trace!(
                            "ik '{bone_name}': {} iterations, converged: {}",
                            outcome.iterations,
                            outcome.converged
                        );
                    }
                    Err(err) => {
                        // Misconfigured attachment; skip it this frame
                        // rather than crash.
                        log::error!("skipping ik attachment: {err}");
                    }
                }
            }
        }

        // Phase 2: final pass with skinning output.
        propagate(
            &self.skeleton,
            &self.pose,
            &mut self.palette,
            Skinning::Include,
        );
    }

    /// Per-bone `world * inverse_bind` matrices for the renderer, indexed
    /// by bone id. Valid until the next [`update`](Self::update) call.
    #[must_use]
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.palette.skinning
    }

    /// World-space transform of a bone in the current pose (no inverse
    /// bind pose), e.g. for parenting a held object to a hand.
    pub fn bone_world_transform(&self, bone_name: &str) -> Result<Sqt> {
        let id = self.skeleton.bone_id(bone_name)?;
        let world = self.transform.to_affine() * self.palette.world[id.index()];
        Ok(Sqt::from_affine(&world))
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Flush the queue and cross-fade into the named clip.
    pub fn play(&mut self, clip_name: &str, speed: f32) -> Result<()> {
        let set = self.animation_set(clip_name)?;
        let id = set.clip_id(clip_name)?;
        self.player.play(id, speed);
        Ok(())
    }

    /// Append the named clip; it plays after everything already queued.
    pub fn enqueue(&mut self, clip_name: &str, speed: f32) -> Result<()> {
        let set = self.animation_set(clip_name)?;
        let id = set.clip_id(clip_name)?;
        self.player.enqueue(id, speed);
        Ok(())
    }

    /// Name of the clip at the front of the queue. Lets game logic avoid
    /// re-triggering an animation that is already playing.
    #[must_use]
    pub fn current_clip(&self) -> Option<&str> {
        let set = self.animations.as_ref()?;
        self.player
            .current_clip()
            .map(|id| set.clip(id).name.as_str())
    }

    #[must_use]
    pub const fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    fn animation_set(&self, requested: &str) -> Result<&Arc<AnimationSet>> {
        self.animations
            .as_ref()
            .ok_or_else(|| MarionetteError::ClipNotFound(requested.to_string()))
    }

    // ========================================================================
    // IK attachments
    // ========================================================================

    /// Attaches an IK influence to the named effector bone, replacing any
    /// existing attachment on it.
    pub fn attach_ik(&mut self, bone_name: &str, attachment: IkAttachment) {
        self.iks.insert(bone_name.to_string(), attachment);
    }

    /// Removes the IK influence from the named bone, if present.
    pub fn detach_ik(&mut self, bone_name: &str) {
        self.iks.remove(bone_name);
    }

    /// Mutable access for moving a target from game logic.
    pub fn ik_mut(&mut self, bone_name: &str) -> Option<&mut IkAttachment> {
        self.iks.get_mut(bone_name)
    }

    #[must_use]
    pub fn ik(&self, bone_name: &str) -> Option<&IkAttachment> {
        self.iks.get(bone_name)
    }
}
