//! Error Types
//!
//! Lookup failures and structural violations surface here; numerical
//! degeneracy (zero-length interpolation intervals, near-parallel IK
//! vectors) is guarded locally with safe defaults instead, and IK
//! non-convergence is an expected bounded outcome, not an error.

use thiserror::Error;

/// The main error type for the marionette crate.
#[derive(Error, Debug)]
pub enum MarionetteError {
    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// The named bone does not exist in the skeleton.
    #[error("Bone not found: {0}")]
    BoneNotFound(String),

    /// The named animation clip does not exist in the set.
    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    // ========================================================================
    // Skeleton Construction Errors
    // ========================================================================
    /// A skeleton may only have one root bone.
    #[error("Skeleton already has a root bone (adding '{0}')")]
    MultipleRoots(String),

    /// Bones were added without a root.
    #[error("Skeleton has no root bone")]
    MissingRoot,

    /// Bone names must be unique within a skeleton.
    #[error("Duplicate bone name: {0}")]
    DuplicateBoneName(String),

    /// A bone referenced a parent id that has not been inserted yet.
    #[error("Bone '{bone}' references unknown parent id {parent}")]
    UnknownParent {
        /// Name of the bone being inserted
        bone: String,
        /// The out-of-range parent id
        parent: u32,
    },

    // ========================================================================
    // Animation Data Errors
    // ========================================================================
    /// Keyframe times and values must pair up one-to-one.
    #[error("Keyframe track has {times} times but {values} values")]
    MismatchedTrackLengths {
        /// Number of timestamps
        times: usize,
        /// Number of values
        values: usize,
    },

    /// Keyframe times within one track must be non-decreasing.
    #[error("Keyframe times are not in non-decreasing order (index {0})")]
    UnorderedKeyframes(usize),

    /// Clip names must be unique within one animation set.
    #[error("Duplicate clip name: {0}")]
    DuplicateClipName(String),

    /// A clip channel targets a bone the skeleton does not have. This is a
    /// load-time configuration error, caught when the set is bound.
    #[error("Clip '{clip}' targets bone id {bone} absent from skeleton '{skeleton}'")]
    ClipTargetsUnknownBone {
        /// Name of the offending clip
        clip: String,
        /// The missing bone id
        bone: u32,
        /// Name of the skeleton the set was bound against
        skeleton: String,
    },
}

/// Alias for `Result<T, MarionetteError>`.
pub type Result<T> = std::result::Result<T, MarionetteError>;
