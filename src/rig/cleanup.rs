//! Keeping generated rigs consistent: regeneration, duplicates and orphans.

use log::{debug, info};
use nalgebra::Point3;

use super::chain::{
    bone_chain_matches_loop, bone_chains_match, chain_is_selected, chain_roots, linked_bones,
};
use super::naming::is_hair_rig_bone;
use super::root::hair_rig;
use super::skeleton::{EditSession, Skeleton};
use crate::algo::polyline::ON_LOOP_THRESHOLD;
use crate::config::{BoneSelection, RigParent};
use crate::error::Result;

/// Tolerance of [`remove_duplicate_bones`] (world units).
pub const DUPLICATE_TOLERANCE: f64 = 0.001;

/// Outcome of [`remove_existing_loop_bones`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegenerationReport {
    /// Bones removed so their loops can be regenerated.
    pub removed_bones: Vec<String>,
    /// Number of loops dropped because an unselected chain already covers them.
    pub dropped_loops: usize,
}

/// Prepare loops for generation against the chains already in the rig.
///
/// A chain whose every bone lies on a loop is either removed, so the loop
/// regenerates it, or kept, in which case the loop is dropped. In
/// [`BoneSelection::All`] mode chains are always removed; in
/// [`BoneSelection::Selected`] mode only chains with a selected bone are.
pub fn remove_existing_loop_bones<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    loops: &mut Vec<Vec<Point3<f64>>>,
    mode: BoneSelection,
) -> Result<RegenerationReport> {
    let mut report = RegenerationReport::default();
    let mut drop_loop = vec![false; loops.len()];

    for root in chain_roots(&**session) {
        let chain = linked_bones(&**session, &root);
        let selected = chain_is_selected(&**session, &root);
        let mut remove_chain = false;

        for (i, points) in loops.iter().enumerate() {
            if !bone_chain_matches_loop(&**session, &chain, points, ON_LOOP_THRESHOLD) {
                continue;
            }
            if mode == BoneSelection::All || selected {
                remove_chain = true;
            } else if !drop_loop[i] {
                info!("existing bone chain {} will not be replaced", root);
                drop_loop[i] = true;
            }
        }

        if remove_chain {
            info!("existing bone chain {} is to be regenerated", root);
            for name in chain {
                if session.contains(&name) {
                    session.remove_bone(&name)?;
                    report.removed_bones.push(name);
                }
            }
        }
    }

    let mut i = 0;
    loops.retain(|_| {
        let keep = !drop_loop[i];
        i += 1;
        keep
    });
    report.dropped_loops = drop_loop.iter().filter(|&&d| d).count();

    Ok(report)
}

/// Remove chains that duplicate an earlier chain of the same rig.
///
/// For each chain root in order, later siblings are compared from the last
/// one back; a sibling whose every bone matches a bone of the earlier chain
/// within `tolerance` is removed. Returns the removed bone names.
pub fn remove_duplicate_bones<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    tolerance: f64,
) -> Result<Vec<String>> {
    let mut remove = Vec::new();

    for parent in RigParent::ALL {
        let Some(rig) = hair_rig(&**session, parent) else {
            continue;
        };
        let roots = session.children(&rig.name);
        let mut removed_roots: Vec<&String> = Vec::new();

        for root in &roots {
            if removed_roots.contains(&root) {
                continue;
            }
            let chain = linked_bones(&**session, root);
            for test_root in roots.iter().skip(1).rev() {
                if removed_roots.contains(&test_root) {
                    continue;
                }
                if test_root == root {
                    break;
                }
                let test_chain = linked_bones(&**session, test_root);
                if bone_chains_match(&**session, &test_chain, &chain, tolerance) {
                    debug!("chain {} duplicates {}", test_root, root);
                    removed_roots.push(test_root);
                    remove.extend(test_chain);
                }
            }
        }
    }

    let mut removed = Vec::with_capacity(remove.len());
    for name in remove {
        if session.contains(&name) {
            info!("removing duplicate bone {}", name);
            session.remove_bone(&name)?;
            removed.push(name);
        }
    }
    Ok(removed)
}

/// Outcome of [`repair_orphaned_hair_bones`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Hair bones that had no parent and were attached to their rig root.
    pub reparented: Vec<String>,
    /// `(old, new)` names of children renamed to carry their chain's prefix.
    pub renamed: Vec<(String, String)>,
}

/// Reattach and rename stray hair bones, then realign every hair bone's roll.
///
/// Only prefixes whose rig root exists are repaired. Unprefixed children of
/// hair bones take the prefix (recursively), parentless hair bones are
/// parented to the rig root, and every hair bone's z axis is pointed away from
/// its rig root.
pub fn repair_orphaned_hair_bones<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
) -> Result<RepairReport> {
    let mut report = RepairReport::default();

    for parent in RigParent::ALL {
        let Some(rig) = hair_rig(&**session, parent) else {
            continue;
        };
        let prefix = parent.bone_prefix();
        let is_chain_bone =
            |name: &str| RigParent::for_bone(name) == Some(parent) && !is_hair_rig_bone(name);

        // prefix propagation
        let mut work: Vec<String> = session
            .bone_names()
            .into_iter()
            .filter(|n| is_chain_bone(n))
            .collect();
        while let Some(name) = work.pop() {
            for child in session.children(&name) {
                if !child.starts_with(prefix) {
                    let new_name = format!("{}_{}", prefix, child);
                    session.rename_bone(&child, &new_name)?;
                    report.renamed.push((child, new_name.clone()));
                    work.push(new_name);
                }
            }
        }

        let origin = session.to_world(&rig.head);
        let chain_bones: Vec<String> = session
            .bone_names()
            .into_iter()
            .filter(|n| is_chain_bone(n))
            .collect();

        for name in chain_bones {
            let Some(mut bone) = session.bone(&name) else {
                continue;
            };
            if bone.parent.is_none() {
                bone.parent = Some(rig.name.clone());
                bone.connected = false;
                report.reparented.push(name.clone());
            }
            let head = session.to_world(&bone.head);
            let tail = session.to_world(&bone.tail);
            if let Some(z) = (nalgebra::center(&head, &tail) - origin).try_normalize(f64::EPSILON) {
                bone.align_roll(&z);
            }
            session.update_bone(bone)?;
        }
    }

    if !report.reparented.is_empty() || !report.renamed.is_empty() {
        info!(
            "repaired hair bones: {} reparented, {} renamed",
            report.reparented.len(),
            report.renamed.len()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::chain::loop_to_bones;
    use crate::rig::naming::HEAD_RIG_NAME;
    use crate::rig::skeleton::Bone;
    use crate::testing::head_armature;
    use nalgebra::Vector3;

    fn straight_loop(x: f64) -> Vec<Point3<f64>> {
        (0..=10)
            .map(|i| Point3::new(x, -0.1, 1.8 - 0.02 * i as f64))
            .collect()
    }

    #[test]
    fn test_duplicate_chain_removed_keeping_first() {
        let mut arm = head_armature();
        let mut session = EditSession::begin(&mut arm);
        let a = loop_to_bones(&mut session, RigParent::Head, &straight_loop(0.0), 1, 0.1, 0.0).unwrap();
        let b = loop_to_bones(&mut session, RigParent::Head, &straight_loop(0.00025), 2, 0.1, 0.0)
            .unwrap();
        let c = loop_to_bones(&mut session, RigParent::Head, &straight_loop(0.05), 3, 0.1, 0.0).unwrap();

        let removed = remove_duplicate_bones(&mut session, DUPLICATE_TOLERANCE).unwrap();
        assert_eq!(removed, b);
        assert!(a.iter().all(|n| session.contains(n)));
        assert!(c.iter().all(|n| session.contains(n)));
    }

    #[test]
    fn test_duplicate_tolerance_scales_with_armature() {
        let mut arm = head_armature();
        arm.set_world_matrix(nalgebra::Matrix4::new_scaling(2.0));
        let mut session = EditSession::begin(&mut arm);
        let loop_at = |x: f64| -> Vec<Point3<f64>> {
            (0..=10)
                .map(|i| Point3::new(x, -0.2, 3.6 - 0.04 * i as f64))
                .collect()
        };
        loop_to_bones(&mut session, RigParent::Head, &loop_at(0.0), 1, 0.2, 0.0).unwrap();
        let near = loop_to_bones(&mut session, RigParent::Head, &loop_at(0.0004), 2, 0.2, 0.0).unwrap();
        let far = loop_to_bones(&mut session, RigParent::Head, &loop_at(0.003), 3, 0.2, 0.0).unwrap();

        let removed = remove_duplicate_bones(&mut session, DUPLICATE_TOLERANCE).unwrap();
        assert_eq!(removed, near);
        assert!(far.iter().all(|n| session.contains(n)));
    }

    #[test]
    fn test_existing_chain_regenerated_in_all_mode() {
        let mut arm = head_armature();
        let mut session = EditSession::begin(&mut arm);
        let points = straight_loop(0.0);
        let a = loop_to_bones(&mut session, RigParent::Head, &points, 1, 0.1, 0.0).unwrap();

        let mut loops = vec![points.clone(), straight_loop(0.05)];
        let report = remove_existing_loop_bones(&mut session, &mut loops, BoneSelection::All).unwrap();
        assert_eq!(report.removed_bones, a);
        assert_eq!(report.dropped_loops, 0);
        assert_eq!(loops.len(), 2);
    }

    #[test]
    fn test_unselected_chain_drops_loop() {
        let mut arm = head_armature();
        let mut session = EditSession::begin(&mut arm);
        let points = straight_loop(0.0);
        let a = loop_to_bones(&mut session, RigParent::Head, &points, 1, 0.1, 0.0).unwrap();
        session.deselect_all().unwrap();

        let mut loops = vec![points.clone(), straight_loop(0.05)];
        let report =
            remove_existing_loop_bones(&mut session, &mut loops, BoneSelection::Selected).unwrap();
        assert!(report.removed_bones.is_empty());
        assert_eq!(report.dropped_loops, 1);
        assert_eq!(loops.len(), 1);
        assert!(a.iter().all(|n| session.contains(n)));

        session.set_selected(&a[1], true).unwrap();
        let mut loops = vec![points];
        let report =
            remove_existing_loop_bones(&mut session, &mut loops, BoneSelection::Selected).unwrap();
        assert_eq!(report.removed_bones, a);
        assert_eq!(loops.len(), 1);
    }

    #[test]
    fn test_repair_orphans() {
        let mut arm = head_armature();
        let mut session = EditSession::begin(&mut arm);
        loop_to_bones(&mut session, RigParent::Head, &straight_loop(0.0), 1, 0.1, 0.0).unwrap();
        session
            .insert_bone(Bone::new(
                "RL_Hair_9_0",
                Point3::new(0.1, -0.1, 1.8),
                Point3::new(0.1, -0.1, 1.7),
            ))
            .unwrap();
        session
            .insert_bone(
                Bone::new("Extra", Point3::new(0.1, -0.1, 1.7), Point3::new(0.1, -0.1, 1.6))
                    .with_parent("RL_Hair_9_0"),
            )
            .unwrap();

        let report = repair_orphaned_hair_bones(&mut session).unwrap();
        assert_eq!(report.reparented, vec!["RL_Hair_9_0".to_string()]);
        assert_eq!(
            report.renamed,
            vec![("Extra".to_string(), "RL_Hair_Extra".to_string())]
        );
        assert_eq!(
            session.bone("RL_Hair_9_0").unwrap().parent.as_deref(),
            Some(HEAD_RIG_NAME)
        );
        assert_eq!(
            session.bone("RL_Hair_Extra").unwrap().parent.as_deref(),
            Some("RL_Hair_9_0")
        );

        // roll points away from the rig root
        let bone = session.bone("RL_Hair_9_0").unwrap();
        let rig = session.bone(HEAD_RIG_NAME).unwrap();
        let away: Vector3<f64> = nalgebra::center(&bone.head, &bone.tail) - rig.head;
        assert!(bone.z_axis.dot(&away) > 0.0);
    }

    #[test]
    fn test_repair_without_rig_is_noop() {
        let mut arm = head_armature();
        let mut session = EditSession::begin(&mut arm);
        session
            .insert_bone(Bone::new(
                "RL_Hair_1_0",
                Point3::new(0.1, -0.1, 1.8),
                Point3::new(0.1, -0.1, 1.7),
            ))
            .unwrap();
        let report = repair_orphaned_hair_bones(&mut session).unwrap();
        assert_eq!(report, RepairReport::default());
        assert!(session.bone("RL_Hair_1_0").unwrap().parent.is_none());
    }
}
