use crate::math::Sqt;
use crate::skeleton::{BoneId, Skeleton};

/// One instant's bone-local transforms for a single character instance.
///
/// Dense over bone ids; a `None` slot means the bone carries no animation
/// or IK contribution this frame and falls back to its bind-pose local
/// transform during propagation. Never shared between instances.
#[derive(Debug, Clone)]
pub struct Pose {
    locals: Vec<Option<Sqt>>,
}

impl Pose {
    #[must_use]
    pub fn new(bone_count: usize) -> Self {
        Self {
            locals: vec![None; bone_count],
        }
    }

    /// A pose holding every bone's bind-pose local transform. Used for
    /// instances of models that ship without animation clips.
    #[must_use]
    pub fn from_bind(skeleton: &Skeleton) -> Self {
        Self {
            locals: skeleton.bones().map(|b| Some(b.local_bind)).collect(),
        }
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.locals.len()
    }

    #[must_use]
    pub fn get(&self, id: BoneId) -> Option<&Sqt> {
        self.locals.get(id.index()).and_then(Option::as_ref)
    }

    pub fn set(&mut self, id: BoneId, local: Sqt) {
        self.locals[id.index()] = Some(local);
    }

    /// Drops every contribution, reverting all bones to bind fallback.
    pub fn reset(&mut self) {
        self.locals.fill(None);
    }

    /// Writes the cross-fade between two poses into `self`.
    ///
    /// Translation and scale blend linearly, rotation spherically. A bone
    /// present in only one input keeps that input's transform; a bone in
    /// neither stays without contribution.
    pub fn blend_from(&mut self, source: &Self, target: &Self, t: f32) {
        debug_assert_eq!(source.locals.len(), self.locals.len());
        debug_assert_eq!(target.locals.len(), self.locals.len());
        for (out, (src, dst)) in self
            .locals
            .iter_mut()
            .zip(source.locals.iter().zip(target.locals.iter()))
        {
            *out = match (src, dst) {
                (Some(a), Some(b)) => Some(a.interpolate(b, t)),
                (Some(a), None) => Some(*a),
                (None, Some(b)) => Some(*b),
                (None, None) => None,
            };
        }
    }
}
