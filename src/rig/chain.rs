//! Bone chains: generating them from polylines and reading them back.
//!
//! A chain is a run of bones from a root bone (parented to the rig root) down
//! single-child links to a tip. [`loop_to_bones`] builds one from an ordered
//! polyline; [`collect_bone_chains`] reads existing chains back as
//! [`BoneDef`] sequences in world space for weight assignment.

use log::debug;
use nalgebra::{Point3, Vector3};

use super::naming::{chain_bone_name, chain_prefix, is_hair_bone, HAIR_BONE_LAYER};
use super::root::{ensure_hair_rig, hair_rig};
use super::skeleton::{Bone, EditSession, Skeleton};
use crate::algo::polyline::{distance_from_line, eval_loop_at, is_on_loop, loop_length};
use crate::config::{BoneSelection, RigParent};
use crate::error::Result;

/// Factor by which the last bone of a chain is extended when read back.
const TIP_EXTENSION: f64 = 4.0;

/// Offset of a custom bone's head from the rig root (world space).
const CUSTOM_BONE_OFFSET: [f64; 3] = [0.0, 0.05, 0.15];

/// Step used to move a custom bone clear of existing bone heads.
const CUSTOM_BONE_NUDGE: [f64; 3] = [0.0, 0.0175, 0.0];

/// Bone heads closer than this to a new custom bone's head block it.
const NEARBY_BONE_DISTANCE: f64 = 0.01;

/// A bone of an existing chain, in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDef {
    /// Bone name (also its weight group name).
    pub name: String,
    /// World-space head.
    pub head: Point3<f64>,
    /// World-space tail (extended for the last bone of a chain).
    pub tail: Point3<f64>,
    /// `tail - head`.
    pub line: Vector3<f64>,
    /// Unit direction of `line`.
    pub dir: Vector3<f64>,
    /// Length of `line`.
    pub length: f64,
}

impl BoneDef {
    /// Describe the segment from `head` to `tail`.
    pub fn new(name: impl Into<String>, head: Point3<f64>, tail: Point3<f64>) -> Self {
        let line = tail - head;
        Self {
            name: name.into(),
            head,
            tail,
            line,
            dir: line.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros),
            length: line.norm(),
        }
    }

    /// Distance from `co` to this bone and the fraction along it of the closest point.
    #[inline]
    pub fn distance_to(&self, co: &Point3<f64>) -> (f64, f64) {
        distance_from_line(co, &self.head, &self.tail)
    }
}

/// Bones of one chain, root first.
pub type BoneChain = Vec<BoneDef>;

/// Whether any bone belongs to chain `loop_index` of `prefix`.
pub fn contains_hair_bone_chain<S: Skeleton + ?Sized>(skeleton: &S, loop_index: usize, prefix: &str) -> bool {
    let start = chain_prefix(prefix, loop_index);
    skeleton.bone_names().iter().any(|n| n.starts_with(&start))
}

/// The first chain index at or after `loop_index` with no existing bones.
pub fn find_unused_hair_bone_index<S: Skeleton + ?Sized>(
    skeleton: &S,
    mut loop_index: usize,
    prefix: &str,
) -> usize {
    while contains_hair_bone_chain(skeleton, loop_index, prefix) {
        loop_index += 1;
    }
    loop_index
}

/// Roll axis pointing from the rig root through the middle of a segment.
fn away_from(origin: &Point3<f64>, head: &Point3<f64>, tail: &Point3<f64>) -> Vector3<f64> {
    let mid = nalgebra::center(head, tail);
    (mid - origin).try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z)
}

/// Generate a bone chain along a world-space polyline.
///
/// The first `skip_length` of the loop (at most three quarters of it) is left
/// bare, and the rest is split into `max(1, round(rest / bone_length))` equal
/// arc-length segments named `{prefix}_{loop_index}_{segment}`. The first bone
/// hangs unconnected from the rig root, later bones connect to their parent.
/// New bones are selected.
///
/// Returns the created bone names; empty when the loop has fewer than two
/// points or no length.
pub fn loop_to_bones<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    parent: RigParent,
    points: &[Point3<f64>],
    loop_index: usize,
    bone_length: f64,
    skip_length: f64,
) -> Result<Vec<String>> {
    if points.len() < 2 {
        return Ok(Vec::new());
    }
    let length = loop_length(points);
    if length <= 0.0 || bone_length <= 0.0 {
        return Ok(Vec::new());
    }

    let skip_length = skip_length.min(3.0 * length / 4.0);
    let segments = (((length - skip_length) / bone_length).round() as usize).max(1);
    let mut fac = skip_length / length;
    let df = (1.0 - fac) / segments as f64;

    let rig = ensure_hair_rig(session, parent)?;
    let origin = session.to_world(&rig.head);
    let prefix = parent.bone_prefix();

    let mut created = Vec::with_capacity(segments);
    let mut parent_name = rig.name.clone();

    for s in 0..segments {
        let (Some(world_head), Some(world_tail)) = (
            eval_loop_at(points, length, fac),
            eval_loop_at(points, length, fac + df),
        ) else {
            break;
        };

        let name = chain_bone_name(prefix, loop_index, s);
        let mut bone = Bone::new(name.clone(), session.to_local(&world_head), session.to_local(&world_tail))
            .with_parent(parent_name.as_str())
            .with_layer(HAIR_BONE_LAYER);
        bone.align_roll(&away_from(&origin, &world_head, &world_tail));
        bone.connected = s > 0;
        bone.selected = true;
        session.insert_bone(bone)?;

        created.push(name.clone());
        parent_name = name;
        fac += df;
    }

    debug!("loop {} -> {} bones", loop_index, created.len());
    Ok(created)
}

/// Add a single-bone chain pointing up, clear of existing bones.
///
/// The head starts at the rig root plus a fixed offset and steps along +y
/// until no bone head lies within a centimeter.
pub fn custom_bone<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    parent: RigParent,
    loop_index: usize,
    bone_length: f64,
) -> Result<String> {
    let rig = ensure_hair_rig(session, parent)?;
    let origin = session.to_world(&rig.head);

    let heads: Vec<Point3<f64>> = session
        .bone_names()
        .iter()
        .filter_map(|n| session.bone(n))
        .map(|b| session.to_world(&b.head))
        .collect();

    let mut world_head = origin + Vector3::from(CUSTOM_BONE_OFFSET);
    while heads.iter().any(|h| (h - world_head).norm() < NEARBY_BONE_DISTANCE) {
        world_head += Vector3::from(CUSTOM_BONE_NUDGE);
    }
    let world_tail = world_head + Vector3::new(0.0, 0.0, bone_length);

    let name = chain_bone_name(parent.bone_prefix(), loop_index, 0);
    let mut bone = Bone::new(name.clone(), session.to_local(&world_head), session.to_local(&world_tail))
        .with_parent(rig.name.as_str())
        .with_layer(HAIR_BONE_LAYER);
    bone.align_roll(&away_from(&origin, &world_head, &world_tail));
    bone.selected = true;
    session.insert_bone(bone)?;

    Ok(name)
}

/// A bone and all its descendants, depth first, parents before children.
pub fn linked_bones<S: Skeleton + ?Sized>(skeleton: &S, root: &str) -> Vec<String> {
    let mut bones = Vec::new();
    let mut stack = vec![root.to_string()];
    while let Some(name) = stack.pop() {
        if bones.contains(&name) {
            continue;
        }
        let mut children = skeleton.children(&name);
        children.reverse();
        stack.extend(children);
        bones.push(name);
    }
    bones
}

/// Whether every bone of chain `a` has a counterpart in chain `b`.
///
/// Bones match when the sum of their head and tail distances (armature space)
/// is below `tolerance` divided by the armature's mean scale.
pub fn bone_chains_match<S: Skeleton + ?Sized>(skeleton: &S, a: &[String], b: &[String], tolerance: f64) -> bool {
    let scale = skeleton.scale();
    let tolerance = tolerance / ((scale.x + scale.y + scale.z) / 3.0);

    let bones_b: Vec<Bone> = b.iter().filter_map(|n| skeleton.bone(n)).collect();
    a.iter().all(|name| {
        skeleton.bone(name).is_some_and(|bone_a| {
            bones_b.iter().any(|bone_b| {
                (bone_a.head - bone_b.head).norm() + (bone_a.tail - bone_b.tail).norm() < tolerance
            })
        })
    })
}

/// Whether every bone of a chain lies on a world-space loop.
pub fn bone_chain_matches_loop<S: Skeleton + ?Sized>(
    skeleton: &S,
    bones: &[String],
    points: &[Point3<f64>],
    threshold: f64,
) -> bool {
    bones.iter().all(|name| {
        skeleton.bone(name).is_some_and(|bone| {
            is_on_loop(&skeleton.to_world(&bone.head), points, threshold)
                && is_on_loop(&skeleton.to_world(&bone.tail), points, threshold)
        })
    })
}

/// Whether any bone of the chain starting at `root` is selected.
pub fn chain_is_selected<S: Skeleton + ?Sized>(skeleton: &S, root: &str) -> bool {
    linked_bones(skeleton, root)
        .iter()
        .any(|n| skeleton.bone(n).is_some_and(|b| b.selected))
}

/// Read the chain starting at `root` as world-space bone definitions.
///
/// Returns `None` if the chain branches. The last bone is extended to four
/// times its length so it covers the card tip.
pub fn read_bone_chain<S: Skeleton + ?Sized>(skeleton: &S, root: &str) -> Option<BoneChain> {
    let mut chain = Vec::new();
    let mut current = root.to_string();
    loop {
        let bone = skeleton.bone(&current)?;
        let children = skeleton.children(&current);
        if children.len() > 1 {
            return None;
        }

        let head = skeleton.to_world(&bone.head);
        let mut tail = skeleton.to_world(&bone.tail);
        if children.is_empty() {
            tail = head + (tail - head) * TIP_EXTENSION;
        }
        chain.push(BoneDef::new(bone.name, head, tail));

        match children.into_iter().next() {
            Some(child) if !chain.iter().any(|d: &BoneDef| d.name == child) => current = child,
            _ => return Some(chain),
        }
    }
}

/// Names of the chain roots hanging from both rig roots, head rig first.
pub fn chain_roots<S: Skeleton + ?Sized>(skeleton: &S) -> Vec<String> {
    RigParent::ALL
        .iter()
        .filter_map(|&p| hair_rig(skeleton, p))
        .flat_map(|rig| skeleton.children(&rig.name))
        .collect()
}

/// Read back the hair chains under both rig roots.
///
/// In [`BoneSelection::Selected`] mode only chains with a selected bone are
/// returned. Branching chains are skipped.
pub fn collect_bone_chains<S: Skeleton + ?Sized>(skeleton: &S, mode: BoneSelection) -> Vec<BoneChain> {
    chain_roots(skeleton)
        .into_iter()
        .filter(|root| is_hair_bone(root))
        .filter(|root| mode == BoneSelection::All || chain_is_selected(skeleton, root))
        .filter_map(|root| {
            let chain = read_bone_chain(skeleton, &root);
            if chain.is_none() {
                debug!("chain {} branches, skipping", root);
            }
            chain
        })
        .collect()
}
