//! The host-side skeleton seam.
//!
//! Rig code never holds references into a host's bone storage. Bones are
//! addressed by name and read as [`Bone`] snapshots; every change goes through
//! an [`EditSession`], which brackets the work with the host's
//! [`begin_edit`](Skeleton::begin_edit) and [`end_edit`](Skeleton::end_edit)
//! hooks.

use std::ops::{Deref, DerefMut};

use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::Result;

/// Whether the armature displays its animated pose or its rest pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosePosition {
    /// The animated pose.
    #[default]
    Pose,
    /// The rest pose.
    Rest,
}

/// A snapshot of one bone in armature space.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Unique bone name.
    pub name: String,
    /// Head (root end) position.
    pub head: Point3<f64>,
    /// Tail (tip end) position.
    pub tail: Point3<f64>,
    /// The bone's local z axis; perpendicular to the bone.
    pub z_axis: Vector3<f64>,
    /// Parent bone name.
    pub parent: Option<String>,
    /// Whether the head is attached to the parent's tail.
    pub connected: bool,
    /// Display layer.
    pub layer: u32,
    /// Selection state.
    pub selected: bool,
}

impl Bone {
    /// Create an unparented, unselected bone with a roll along +z.
    pub fn new(name: impl Into<String>, head: Point3<f64>, tail: Point3<f64>) -> Self {
        let mut bone = Self {
            name: name.into(),
            head,
            tail,
            z_axis: Vector3::z(),
            parent: None,
            connected: false,
            layer: 0,
            selected: false,
        };
        bone.align_roll(&Vector3::z());
        bone
    }

    /// Set the parent bone.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the display layer.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Vector from head to tail.
    pub fn vector(&self) -> Vector3<f64> {
        self.tail - self.head
    }

    /// Length of the bone.
    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Roll the bone so its z axis points as close to `axis` as possible.
    ///
    /// The z axis is `axis` with its component along the bone removed. When
    /// `axis` is parallel to the bone (or zero) the roll is left unchanged.
    pub fn align_roll(&mut self, axis: &Vector3<f64>) {
        let Some(dir) = self.vector().try_normalize(f64::EPSILON) else {
            return;
        };
        if let Some(z) = (axis - dir * dir.dot(axis)).try_normalize(1e-12) {
            self.z_axis = z;
        }
    }
}

/// An armature owned by a host application.
///
/// Bone positions are in armature space; [`world_matrix`](Skeleton::world_matrix)
/// maps them to world space.
pub trait Skeleton {
    /// Armature-to-world transform.
    fn world_matrix(&self) -> Matrix4<f64>;

    /// Current pose position.
    fn pose_position(&self) -> PosePosition;

    /// Switch between pose and rest position.
    fn set_pose_position(&mut self, position: PosePosition);

    /// All bone names in creation order.
    fn bone_names(&self) -> Vec<String>;

    /// Snapshot of a bone.
    fn bone(&self, name: &str) -> Option<Bone>;

    /// Names of a bone's direct children, in creation order.
    fn children(&self, name: &str) -> Vec<String>;

    /// Enter bone editing.
    fn begin_edit(&mut self);

    /// Leave bone editing, committing changes.
    fn end_edit(&mut self);

    /// Add a bone. Fails if the name is taken or the parent is missing.
    fn insert_bone(&mut self, bone: Bone) -> Result<()>;

    /// Replace an existing bone's data (matched by name).
    fn update_bone(&mut self, bone: Bone) -> Result<()>;

    /// Remove a bone. Its children are reparented to its parent.
    fn remove_bone(&mut self, name: &str) -> Result<()>;

    /// Rename a bone, keeping its children attached.
    fn rename_bone(&mut self, old: &str, new: &str) -> Result<()>;

    /// Lock or unlock location, rotation and scale of a pose bone.
    fn set_pose_lock(&mut self, name: &str, locked: bool) -> Result<()>;

    /// Whether a pose bone's transforms are locked.
    fn is_pose_locked(&self, name: &str) -> bool;

    /// Select or deselect a bone.
    fn set_selected(&mut self, name: &str, selected: bool) -> Result<()>;

    /// Whether a bone exists.
    fn contains(&self, name: &str) -> bool {
        self.bone(name).is_some()
    }

    /// Per-axis scale of the armature's world transform.
    fn scale(&self) -> Vector3<f64> {
        let m = self.world_matrix();
        Vector3::new(
            m.fixed_view::<3, 1>(0, 0).norm(),
            m.fixed_view::<3, 1>(0, 1).norm(),
            m.fixed_view::<3, 1>(0, 2).norm(),
        )
    }

    /// Map an armature-space point to world space.
    fn to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        self.world_matrix().transform_point(p)
    }

    /// Map a world-space point to armature space.
    ///
    /// A singular world matrix maps points unchanged.
    fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        match self.world_matrix().try_inverse() {
            Some(inv) => inv.transform_point(p),
            None => *p,
        }
    }
}

/// Scoped bone editing.
///
/// Creating a session calls [`Skeleton::begin_edit`]; dropping it calls
/// [`Skeleton::end_edit`].
pub struct EditSession<'a, S: Skeleton + ?Sized> {
    skeleton: &'a mut S,
}

impl<'a, S: Skeleton + ?Sized> EditSession<'a, S> {
    /// Start editing.
    pub fn begin(skeleton: &'a mut S) -> Self {
        skeleton.begin_edit();
        Self { skeleton }
    }

    /// Deselect every bone.
    pub fn deselect_all(&mut self) -> Result<()> {
        for name in self.skeleton.bone_names() {
            self.skeleton.set_selected(&name, false)?;
        }
        Ok(())
    }
}

impl<S: Skeleton + ?Sized> Deref for EditSession<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.skeleton
    }
}

impl<S: Skeleton + ?Sized> DerefMut for EditSession<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.skeleton
    }
}

impl<S: Skeleton + ?Sized> Drop for EditSession<'_, S> {
    fn drop(&mut self) {
        self.skeleton.end_edit();
    }
}

/// Switch to rest position, returning the previous position.
pub fn reset_pose<S: Skeleton + ?Sized>(skeleton: &mut S) -> PosePosition {
    let previous = skeleton.pose_position();
    skeleton.set_pose_position(PosePosition::Rest);
    previous
}

/// Restore a pose position saved by [`reset_pose`].
pub fn restore_pose<S: Skeleton + ?Sized>(skeleton: &mut S, previous: PosePosition) {
    skeleton.set_pose_position(previous);
}
