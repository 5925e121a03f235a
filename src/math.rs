//! Scale / quaternion / translation transforms.
//!
//! The decomposed form is what animation sampling, pose blending and the IK
//! solver all operate on; matrices are only composed at the propagation
//! boundary. Internally `Affine3A` is used for transform math and `Mat4`
//! only appears at the renderer-facing skinning output.

use glam::{Affine3A, Quat, Vec3};

/// A transform decomposed into independent scale, rotation and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sqt {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Sqt {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decomposes an affine transform.
    ///
    /// Shear is lost in the decomposition; bone transforms never carry it.
    #[must_use]
    pub fn from_affine(mat: &Affine3A) -> Self {
        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Blends two transforms: translation and scale linearly, rotation
    /// spherically.
    #[must_use]
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Pivots the transform around its own origin by `angle` radians about
    /// `axis`. A degenerate axis leaves the transform untouched.
    pub fn rotate_about_self(&mut self, angle: f32, axis: Vec3) {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return;
        }
        self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
    }
}

impl Default for Sqt {
    fn default() -> Self {
        Self::IDENTITY
    }
}
