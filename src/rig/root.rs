//! Rig root bones.
//!
//! Each anatomical parent (head or jaw) gets one rig root bone that every hair
//! chain of that parent hangs from. The root sits roughly in the middle of the
//! head so chain rolls can point away from it.

use log::info;
use nalgebra::{Point3, Vector3};

use super::naming::{EYE_BONE_NAMES, RIG_ROOT_LAYER};
use super::skeleton::{Bone, EditSession, Skeleton};
use crate::config::RigParent;
use crate::error::{Result, TressError};

/// Length of a newly created rig root bone (along +y, world space).
const RIG_ROOT_LENGTH: f64 = 1.0 / 32.0;

/// Name of the first anatomical anchor bone present for `parent`.
pub fn anchor_bone_name<S: Skeleton + ?Sized>(skeleton: &S, parent: RigParent) -> Option<&'static str> {
    parent
        .anchor_bone_names()
        .iter()
        .copied()
        .find(|name| skeleton.contains(name))
}

/// World-space position of the rig root for `parent`.
///
/// The head bone's head is used as the reference. When eye bones exist, head
/// mode takes the eye height and jaw mode moves a third of the way from the
/// eyes back towards the head bone in y. Without eyes the head bone's head is
/// used as is. Returns `None` without a head bone.
pub fn hair_rig_position<S: Skeleton + ?Sized>(skeleton: &S, parent: RigParent) -> Option<Point3<f64>> {
    let head_name = anchor_bone_name(skeleton, RigParent::Head)?;
    let head_pos = skeleton.to_world(&skeleton.bone(head_name)?.head);

    let eyes: Vec<Point3<f64>> = EYE_BONE_NAMES
        .iter()
        .filter_map(|name| skeleton.bone(name))
        .map(|b| skeleton.to_world(&b.head))
        .collect();

    if eyes.is_empty() {
        return Some(head_pos);
    }

    let eye_sum: Vector3<f64> = eyes.iter().map(|p| p.coords).sum();
    let eye_pos = eye_sum / eyes.len() as f64;

    Some(match parent {
        RigParent::Head => Point3::new(head_pos.x, head_pos.y, eye_pos.z),
        RigParent::Jaw => Point3::new(head_pos.x, (head_pos.y + 2.0 * eye_pos.y) / 3.0, head_pos.z),
    })
}

/// The rig root bone of `parent`, if it exists.
pub fn hair_rig<S: Skeleton + ?Sized>(skeleton: &S, parent: RigParent) -> Option<Bone> {
    skeleton.bone(parent.rig_name())
}

/// Whether chains of `parent` have a rig root to hang from.
///
/// True when the rig root exists, or when both the anchor bone and a head bone
/// to position a new root are present.
pub fn can_place_hair_rig<S: Skeleton + ?Sized>(skeleton: &S, parent: RigParent) -> bool {
    hair_rig(skeleton, parent).is_some()
        || (anchor_bone_name(skeleton, parent).is_some() && hair_rig_position(skeleton, parent).is_some())
}

/// The rig root bone of `parent`, creating it if missing.
///
/// The new root is parented to the anatomical anchor bone, placed at
/// [`hair_rig_position`] and points along world +y. Fails with
/// [`TressError::NotFound`] when there is no anchor or head bone.
pub fn ensure_hair_rig<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    parent: RigParent,
) -> Result<Bone> {
    if let Some(rig) = hair_rig(&**session, parent) {
        return Ok(rig);
    }

    let anchor = anchor_bone_name(&**session, parent)
        .ok_or_else(|| TressError::not_found("anchor bone", format!("{:?}", parent)))?;
    let position = hair_rig_position(&**session, parent)
        .ok_or_else(|| TressError::not_found("head bone", format!("{:?}", RigParent::Head)))?;

    let head = session.to_local(&position);
    let tail = session.to_local(&(position + Vector3::new(0.0, RIG_ROOT_LENGTH, 0.0)));
    let mut rig = Bone::new(parent.rig_name(), head, tail)
        .with_parent(anchor)
        .with_layer(RIG_ROOT_LAYER);
    rig.align_roll(&Vector3::z());

    session.insert_bone(rig.clone())?;
    info!("created hair rig {} under {}", rig.name, anchor);
    Ok(rig)
}
