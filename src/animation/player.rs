use std::collections::VecDeque;

use crate::animation::clip::{AnimationSet, ClipId};
use crate::animation::pose::Pose;

/// Cross-fade duration used when none is configured explicitly.
pub const DEFAULT_BLEND_DURATION: f32 = 0.25;

/// Playback state of the cross-fade between two clips.
#[derive(Debug, Clone)]
pub enum BlendState {
    /// Playing the front clip directly.
    Steady,
    /// Fading from a frozen snapshot of the previous output toward the new
    /// front clip's starting pose. Clip time does not advance while
    /// blending; the new clip starts from zero once the fade completes.
    Blending {
        source: Pose,
        target: Pose,
        elapsed: f32,
    },
}

/// Per-instance playback queue and blend state machine.
///
/// The queue is never empty during steady-state update: whenever it drains,
/// the set's idle clip is auto-enqueued. Every change of the front clip
/// (natural completion or an explicit flush) triggers a cross-fade from the
/// last output pose to the new clip's first frame.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    queue: VecDeque<ClipId>,
    elapsed: f32,
    speed: f32,
    blend_duration: f32,
    blend: BlendState,
    pending_swap: bool,
}

impl AnimationPlayer {
    #[must_use]
    pub fn new(blend_duration: f32) -> Self {
        Self {
            queue: VecDeque::new(),
            elapsed: 0.0,
            speed: 1.0,
            blend_duration: blend_duration.max(0.0),
            blend: BlendState::Steady,
            pending_swap: false,
        }
    }

    /// Flush-and-replace: drop everything queued and cross-fade into
    /// `clip`. The flush is unconditional; the cross-fade only triggers
    /// when the front clip actually changes, so re-playing the current
    /// clip updates the speed and discards the tail without restarting.
    pub fn play(&mut self, clip: ClipId, speed: f32) {
        self.speed = speed;
        let front_unchanged = self.queue.front() == Some(&clip);
        self.queue.clear();
        self.queue.push_back(clip);
        if !front_unchanged {
            self.pending_swap = true;
        }
    }

    /// Append-and-play: let the current clip finish first. The blend
    /// happens when `clip` naturally reaches the front.
    pub fn enqueue(&mut self, clip: ClipId, speed: f32) {
        self.speed = speed;
        self.queue.push_back(clip);
    }

    #[must_use]
    pub fn current_clip(&self) -> Option<ClipId> {
        self.queue.front().copied()
    }

    #[must_use]
    pub fn is_blending(&self) -> bool {
        matches!(self.blend, BlendState::Blending { .. })
    }

    #[must_use]
    pub const fn playback_speed(&self) -> f32 {
        self.speed
    }

    /// Advances playback by `dt` seconds and writes this frame's output
    /// into `pose`.
    pub fn update(&mut self, dt: f32, set: &AnimationSet, pose: &mut Pose) {
        if self.queue.is_empty() {
            self.queue.push_back(set.idle());
        }

        if self.pending_swap {
            self.pending_swap = false;
            self.begin_transition(set, pose);
        }

        match &mut self.blend {
            BlendState::Blending {
                source,
                target,
                elapsed,
            } => {
                let t = if self.blend_duration > f32::EPSILON {
                    (*elapsed / self.blend_duration).min(1.0)
                } else {
                    1.0
                };
                // Evaluate before advancing so the first blended frame
                // reproduces the snapshot exactly.
                pose.blend_from(source, target, t);
                *elapsed += dt;
                if *elapsed >= self.blend_duration {
                    self.blend = BlendState::Steady;
                }
            }
            BlendState::Steady => {
                let clip = set.clip(self.front());
                let duration = clip.duration();
                if duration <= 0.0 || self.elapsed >= duration {
                    // Zero-duration clips count as already finished; popping
                    // here keeps them from wedging the queue.
                    self.queue.pop_front();
                    if self.queue.is_empty() {
                        self.queue.push_back(set.idle());
                    }
                    self.begin_transition(set, pose);
                } else {
                    clip.sample_pose(self.elapsed, pose);
                    self.elapsed += dt * self.speed;
                }
            }
        }
    }

    /// Snapshots the current output as the blend source and the new front
    /// clip's first frame as the blend target. The output pose is left
    /// untouched: at a blend factor of zero the result is the snapshot.
    fn begin_transition(&mut self, set: &AnimationSet, pose: &Pose) {
        let mut target = Pose::new(pose.bone_count());
        set.clip(self.front()).sample_pose(0.0, &mut target);
        self.elapsed = 0.0;
        self.blend = BlendState::Blending {
            source: pose.clone(),
            target,
            elapsed: 0.0,
        };
    }

    fn front(&self) -> ClipId {
        // The queue is refilled with the idle clip before every use.
        *self.queue.front().expect("animation queue refilled on update")
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_BLEND_DURATION)
    }
}
