#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! CPU-side skeletal animation: bone hierarchies, keyframe clip sampling
//! and blending, hierarchical transform propagation, and a CCD inverse
//! kinematics solver. Produces per-bone skinning matrices for an external
//! renderer; mesh upload, shading and asset import live elsewhere.

pub mod animation;
pub mod curve;
pub mod errors;
pub mod ik;
pub mod instance;
pub mod math;
pub mod skeleton;

pub use animation::{
    AnimationClip, AnimationPlayer, AnimationSet, BlendState, BoneChannel, ClipId, KeyframeTrack,
    Pose,
};
pub use curve::{ArcLengthCurve, CubicCurve, CurveKind};
pub use errors::{MarionetteError, Result};
pub use ik::{CcdOutcome, IK_DISTANCE_TOLERANCE, IkAttachment, IkTarget, solve_ccd};
pub use instance::SkinnedInstance;
pub use math::Sqt;
pub use skeleton::{
    Bone, BoneId, BonePalette, Skeleton, SkeletonBuilder, Skinning, propagate, propagate_subtree,
};
