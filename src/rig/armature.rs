//! In-memory skeleton.

use std::collections::HashSet;

use log::trace;
use nalgebra::Matrix4;

use super::skeleton::{Bone, PosePosition, Skeleton};
use crate::error::{Result, TressError};

/// A standalone armature: bones in creation order plus a world transform.
///
/// Used by the command-line tool and in tests, and as a reference for host
/// integrations of [`Skeleton`].
#[derive(Debug, Clone)]
pub struct Armature {
    world: Matrix4<f64>,
    bones: Vec<Bone>,
    locked: HashSet<String>,
    pose_position: PosePosition,
    edit_depth: usize,
}

impl Default for Armature {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

impl Armature {
    /// Create an empty armature with the given armature-to-world transform.
    pub fn new(world: Matrix4<f64>) -> Self {
        Self {
            world,
            bones: Vec::new(),
            locked: HashSet::new(),
            pose_position: PosePosition::Pose,
            edit_depth: 0,
        }
    }

    /// Number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Iterate over the bones in creation order.
    pub fn bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    /// Whether an edit session is open.
    pub fn is_editing(&self) -> bool {
        self.edit_depth > 0
    }

    /// Set the armature-to-world transform.
    pub fn set_world_matrix(&mut self, world: Matrix4<f64>) {
        self.world = world;
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Bone> {
        self.bones
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| TressError::not_found("bone", name))
    }
}

impl Skeleton for Armature {
    fn world_matrix(&self) -> Matrix4<f64> {
        self.world
    }

    fn pose_position(&self) -> PosePosition {
        self.pose_position
    }

    fn set_pose_position(&mut self, position: PosePosition) {
        self.pose_position = position;
    }

    fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    fn bone(&self, name: &str) -> Option<Bone> {
        self.bones.iter().find(|b| b.name == name).cloned()
    }

    fn children(&self, name: &str) -> Vec<String> {
        self.bones
            .iter()
            .filter(|b| b.parent.as_deref() == Some(name))
            .map(|b| b.name.clone())
            .collect()
    }

    fn begin_edit(&mut self) {
        self.edit_depth += 1;
    }

    fn end_edit(&mut self) {
        self.edit_depth = self.edit_depth.saturating_sub(1);
    }

    fn insert_bone(&mut self, bone: Bone) -> Result<()> {
        if self.position(&bone.name).is_some() {
            return Err(TressError::BoneExists(bone.name));
        }
        if let Some(parent) = &bone.parent {
            if self.position(parent).is_none() {
                return Err(TressError::not_found("parent bone", parent.clone()));
            }
        }
        trace!("insert bone {}", bone.name);
        self.bones.push(bone);
        Ok(())
    }

    fn update_bone(&mut self, bone: Bone) -> Result<()> {
        if let Some(parent) = &bone.parent {
            if self.position(parent).is_none() {
                return Err(TressError::not_found("parent bone", parent.clone()));
            }
        }
        let slot = self.get_mut(&bone.name)?;
        *slot = bone;
        Ok(())
    }

    fn remove_bone(&mut self, name: &str) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| TressError::not_found("bone", name))?;
        let removed = self.bones.remove(index);
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(name) {
                bone.parent = removed.parent.clone();
                bone.connected = false;
            }
        }
        self.locked.remove(name);
        trace!("remove bone {}", name);
        Ok(())
    }

    fn rename_bone(&mut self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.position(new).is_some() {
            return Err(TressError::BoneExists(new.to_string()));
        }
        self.get_mut(old)?.name = new.to_string();
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(old) {
                bone.parent = Some(new.to_string());
            }
        }
        if self.locked.remove(old) {
            self.locked.insert(new.to_string());
        }
        Ok(())
    }

    fn set_pose_lock(&mut self, name: &str, locked: bool) -> Result<()> {
        if self.position(name).is_none() {
            return Err(TressError::not_found("bone", name));
        }
        if locked {
            self.locked.insert(name.to_string());
        } else {
            self.locked.remove(name);
        }
        Ok(())
    }

    fn is_pose_locked(&self, name: &str) -> bool {
        self.locked.contains(name)
    }

    fn set_selected(&mut self, name: &str, selected: bool) -> Result<()> {
        self.get_mut(name)?.selected = selected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::skeleton::EditSession;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn three_bones() -> Armature {
        let mut arm = Armature::default();
        arm.insert_bone(Bone::new("root", Point3::origin(), Point3::new(0.0, 0.0, 1.0)))
            .unwrap();
        arm.insert_bone(
            Bone::new("a", Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 2.0))
                .with_parent("root"),
        )
        .unwrap();
        arm.insert_bone(
            Bone::new("b", Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 0.0, 3.0)).with_parent("a"),
        )
        .unwrap();
        arm
    }

    #[test]
    fn test_insert_rejects_duplicates_and_missing_parents() {
        let mut arm = three_bones();
        assert!(matches!(
            arm.insert_bone(Bone::new("a", Point3::origin(), Point3::new(1.0, 0.0, 0.0))),
            Err(TressError::BoneExists(_))
        ));
        assert!(matches!(
            arm.insert_bone(
                Bone::new("c", Point3::origin(), Point3::new(1.0, 0.0, 0.0)).with_parent("nope")
            ),
            Err(TressError::NotFound { .. })
        ));
        assert_eq!(arm.len(), 3);
    }

    #[test]
    fn test_remove_reparents_children() {
        let mut arm = three_bones();
        arm.remove_bone("a").unwrap();
        assert_eq!(arm.bone("b").unwrap().parent.as_deref(), Some("root"));
        assert_eq!(arm.children("root"), vec!["b".to_string()]);
    }

    #[test]
    fn test_rename_keeps_children() {
        let mut arm = three_bones();
        arm.set_pose_lock("a", true).unwrap();
        arm.rename_bone("a", "x").unwrap();
        assert!(arm.contains("x"));
        assert!(!arm.contains("a"));
        assert_eq!(arm.children("x"), vec!["b".to_string()]);
        assert!(arm.is_pose_locked("x"));
        assert!(arm.rename_bone("x", "b").is_err());
    }

    #[test]
    fn test_edit_session_brackets() {
        let mut arm = three_bones();
        {
            let mut session = EditSession::begin(&mut arm);
            assert!(session.is_editing());
            session.set_selected("b", true).unwrap();
            session.deselect_all().unwrap();
        }
        assert!(!arm.is_editing());
        assert!(!arm.bone("b").unwrap().selected);
    }

    #[test]
    fn test_scale_from_world_matrix() {
        let arm = Armature::new(Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 3.0, 4.0)));
        assert_relative_eq!(arm.scale(), Vector3::new(2.0, 3.0, 4.0));
        let p = arm.to_local(&Point3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
    }
}
