//! Keyframe animation
//!
//! Clips hold per-bone keyframe tracks sampled at a wrapped elapsed time;
//! the player owns the playback queue and the cross-fade blend state that
//! produces one local [`Pose`] per frame.

pub mod clip;
pub mod player;
pub mod pose;
pub mod tracks;
pub mod values;

pub use clip::{AnimationClip, AnimationSet, BoneChannel, ClipId};
pub use player::{AnimationPlayer, BlendState, DEFAULT_BLEND_DURATION};
pub use pose::Pose;
pub use tracks::KeyframeTrack;
pub use values::Interpolatable;
