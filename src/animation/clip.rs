use std::sync::Arc;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::animation::pose::Pose;
use crate::animation::tracks::KeyframeTrack;
use crate::errors::{MarionetteError, Result};
use crate::math::Sqt;
use crate::skeleton::{BoneId, Skeleton};

/// Dense index of a clip within its [`AnimationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(u32);

impl ClipId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The three independent keyframe tracks of one bone within one clip.
///
/// Tracks may have different lengths and need not share timestamps. A
/// missing (empty) track contributes the property identity: zero
/// translation, identity rotation, unit scale.
#[derive(Debug, Clone, Default)]
pub struct BoneChannel {
    pub translation: KeyframeTrack<Vec3>,
    pub rotation: KeyframeTrack<Quat>,
    pub scale: KeyframeTrack<Vec3>,
}

impl BoneChannel {
    #[must_use]
    pub fn new(
        translation: KeyframeTrack<Vec3>,
        rotation: KeyframeTrack<Quat>,
        scale: KeyframeTrack<Vec3>,
    ) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn sample(&self, ticks: f32) -> Sqt {
        Sqt {
            translation: self.translation.sample(ticks).unwrap_or(Vec3::ZERO),
            rotation: self.rotation.sample(ticks).unwrap_or(Quat::IDENTITY),
            scale: self.scale.sample(ticks).unwrap_or(Vec3::ONE),
        }
    }
}

/// A single animation for one skeleton: per-bone keyframe channels plus the
/// tick timing that maps elapsed seconds onto the keyed range.
///
/// Constructed once at model load, immutable, shared across instances.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    id: ClipId,
    pub name: String,
    pub ticks_per_second: f32,
    pub total_ticks: f32,
    channels: FxHashMap<BoneId, BoneChannel>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(
        name: &str,
        ticks_per_second: f32,
        total_ticks: f32,
        channels: FxHashMap<BoneId, BoneChannel>,
    ) -> Self {
        Self {
            // Reassigned when the clip joins a set.
            id: ClipId(0),
            name: name.to_string(),
            ticks_per_second,
            total_ticks,
            channels,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ClipId {
        self.id
    }

    /// Total duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        if self.ticks_per_second > 0.0 {
            self.total_ticks / self.ticks_per_second
        } else {
            0.0
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = (BoneId, &BoneChannel)> {
        self.channels.iter().map(|(&id, ch)| (id, ch))
    }

    /// Elapsed seconds folded onto the keyed tick range by modulo, so any
    /// time beyond the last key replays from the start of the clip.
    #[must_use]
    pub fn wrapped_ticks(&self, seconds: f32) -> f32 {
        if self.total_ticks <= 0.0 {
            return 0.0;
        }
        (seconds * self.ticks_per_second).rem_euclid(self.total_ticks)
    }

    /// Samples one bone's channel, or `None` when the clip does not animate
    /// that bone.
    #[must_use]
    pub fn sample_bone(&self, bone: BoneId, seconds: f32) -> Option<Sqt> {
        let ticks = self.wrapped_ticks(seconds);
        self.channels.get(&bone).map(|ch| ch.sample(ticks))
    }

    /// Samples the whole clip into `pose`. Previous contributions are
    /// dropped first so bones this clip does not animate fall back to bind.
    pub fn sample_pose(&self, seconds: f32, pose: &mut Pose) {
        let ticks = self.wrapped_ticks(seconds);
        pose.reset();
        for (&bone, channel) in &self.channels {
            pose.set(bone, channel.sample(ticks));
        }
    }
}

/// The clips available to one skeleton, indexed by id and name, with a
/// designated idle clip that plays whenever the queue runs dry.
///
/// Binding the set to its skeleton at construction validates every channel
/// target, so a clip referencing a missing bone fails at load time, not
/// mid-frame.
#[derive(Debug, Clone)]
pub struct AnimationSet {
    clips: Vec<Arc<AnimationClip>>,
    by_name: FxHashMap<String, ClipId>,
    idle: ClipId,
}

impl AnimationSet {
    pub fn new(skeleton: &Skeleton, clips: Vec<AnimationClip>, idle_name: &str) -> Result<Self> {
        let mut by_name = FxHashMap::default();
        let mut stored = Vec::with_capacity(clips.len());

        for (index, mut clip) in clips.into_iter().enumerate() {
            for (&bone, _) in &clip.channels {
                if bone.index() >= skeleton.bone_count() {
                    return Err(MarionetteError::ClipTargetsUnknownBone {
                        clip: clip.name.clone(),
                        bone: bone.raw(),
                        skeleton: skeleton.name().to_string(),
                    });
                }
            }
            let id = ClipId(index as u32);
            if by_name.insert(clip.name.clone(), id).is_some() {
                return Err(MarionetteError::DuplicateClipName(clip.name));
            }
            clip.id = id;
            stored.push(Arc::new(clip));
        }

        let idle = by_name
            .get(idle_name)
            .copied()
            .ok_or_else(|| MarionetteError::ClipNotFound(idle_name.to_string()))?;

        Ok(Self {
            clips: stored,
            by_name,
            idle,
        })
    }

    #[must_use]
    pub fn clip(&self, id: ClipId) -> &Arc<AnimationClip> {
        &self.clips[id.index()]
    }

    pub fn clip_id(&self, name: &str) -> Result<ClipId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| MarionetteError::ClipNotFound(name.to_string()))
    }

    pub fn clip_by_name(&self, name: &str) -> Result<&Arc<AnimationClip>> {
        self.clip_id(name).map(|id| self.clip(id))
    }

    #[must_use]
    pub const fn idle(&self) -> ClipId {
        self.idle
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}
