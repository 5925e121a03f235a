//! Bone hierarchy
//!
//! A skeleton is a flat arena of bones indexed by dense [`BoneId`], with
//! parent/child links stored as indices. It is built once per model, is
//! immutable afterwards, and is shared by reference (`Arc`) among every
//! character instance of that model.

pub mod propagator;

pub use propagator::{BonePalette, Skinning, propagate, propagate_subtree};

use glam::Affine3A;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{MarionetteError, Result};
use crate::math::Sqt;

/// Dense index of a bone within its skeleton.
///
/// Ids double as indices into the per-instance parallel arrays (poses,
/// transform palettes), so they are assigned in insertion order with no
/// gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoneId(u32);

impl BoneId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A single joint in the hierarchy.
#[derive(Debug, Clone)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    /// `None` only for the root bone.
    pub parent: Option<BoneId>,
    pub children: SmallVec<[BoneId; 4]>,
    /// Bind-pose transform relative to the parent, from the source asset.
    pub local_bind: Sqt,
    /// Maps model space (in bind pose) into this bone's local space.
    pub inverse_bind: Affine3A,
}

/// An immutable bone tree with name and id lookup.
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    bones: Vec<Bone>,
    by_name: FxHashMap<String, BoneId>,
    root: BoneId,
}

impl Skeleton {
    #[must_use]
    pub fn builder(name: &str) -> SkeletonBuilder {
        SkeletonBuilder {
            name: name.to_string(),
            bones: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn root(&self) -> BoneId {
        self.root
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Id lookup. Ids originating from this skeleton are always valid.
    #[must_use]
    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }

    /// Exact name lookup. Fails with [`MarionetteError::BoneNotFound`]
    /// rather than substituting a default.
    pub fn bone_id(&self, name: &str) -> Result<BoneId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| MarionetteError::BoneNotFound(name.to_string()))
    }

    pub fn bone_by_name(&self, name: &str) -> Result<&Bone> {
        self.bone_id(name).map(|id| self.bone(id))
    }

    pub fn bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    #[must_use]
    pub fn contains(&self, id: BoneId) -> bool {
        id.index() < self.bones.len()
    }
}

/// Incremental skeleton construction with load-time validation.
///
/// Bones must be inserted parents-first; the builder hands out the dense
/// ids, so a forged or out-of-order parent reference is rejected loudly
/// instead of producing a broken hierarchy at runtime.
pub struct SkeletonBuilder {
    name: String,
    bones: Vec<Bone>,
    by_name: FxHashMap<String, BoneId>,
}

impl SkeletonBuilder {
    /// Inserts the root bone. Exactly one root is allowed.
    pub fn root(&mut self, name: &str, local_bind: Sqt, inverse_bind: Affine3A) -> Result<BoneId> {
        if !self.bones.is_empty() {
            return Err(MarionetteError::MultipleRoots(name.to_string()));
        }
        self.insert(name, None, local_bind, inverse_bind)
    }

    /// Inserts a child bone under an already-inserted parent.
    pub fn bone(
        &mut self,
        name: &str,
        parent: BoneId,
        local_bind: Sqt,
        inverse_bind: Affine3A,
    ) -> Result<BoneId> {
        if parent.index() >= self.bones.len() {
            return Err(MarionetteError::UnknownParent {
                bone: name.to_string(),
                parent: parent.raw(),
            });
        }
        self.insert(name, Some(parent), local_bind, inverse_bind)
    }

    fn insert(
        &mut self,
        name: &str,
        parent: Option<BoneId>,
        local_bind: Sqt,
        inverse_bind: Affine3A,
    ) -> Result<BoneId> {
        if self.by_name.contains_key(name) {
            return Err(MarionetteError::DuplicateBoneName(name.to_string()));
        }
        let id = BoneId(self.bones.len() as u32);
        if let Some(parent) = parent {
            self.bones[parent.index()].children.push(id);
        }
        self.bones.push(Bone {
            id,
            name: name.to_string(),
            parent,
            children: SmallVec::new(),
            local_bind,
            inverse_bind,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn finish(self) -> Result<Skeleton> {
        if self.bones.is_empty() {
            return Err(MarionetteError::MissingRoot);
        }
        Ok(Skeleton {
            name: self.name,
            bones: self.bones,
            by_name: self.by_name,
            root: BoneId(0),
        })
    }
}
