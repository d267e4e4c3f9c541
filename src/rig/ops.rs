//! Top-level rig operations.

use log::{info, warn};
use nalgebra::Point3;

use super::chain::{collect_bone_chains, custom_bone, find_unused_hair_bone_index, loop_to_bones};
use super::cleanup::{
    remove_duplicate_bones, remove_existing_loop_bones, repair_orphaned_hair_bones,
    RegenerationReport, RepairReport, DUPLICATE_TOLERANCE,
};
use super::naming::{is_hair_bone, is_hair_rig_bone};
use super::root::{can_place_hair_rig, hair_rig};
use super::skeleton::{reset_pose, restore_pose, EditSession, Skeleton};
use crate::algo::cards::cards_to_length_loops;
use crate::algo::strokes::strokes_to_loops;
use crate::algo::Progress;
use crate::config::{BoneSelection, HairRigConfig, RigParent};
use crate::error::Result;
use crate::mesh::{MeshIndex, MeshProvider};
use crate::weights::{remove_hair_bone_weights, WeightStore};

/// Length of a bone added by [`add_custom_bone`].
pub const CUSTOM_BONE_LENGTH: f64 = 0.05;

/// Outcome of a bone generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateReport {
    /// Bone names of each generated chain, root first.
    pub chains: Vec<Vec<String>>,
    /// Existing chains removed for regeneration, and loops dropped in their favor.
    pub regenerated: RegenerationReport,
    /// Bones removed as duplicates of earlier chains.
    pub duplicates: Vec<String>,
    /// Stray hair bones fixed up before generation.
    pub repaired: RepairReport,
    /// Set when nothing was generated because a required bone is missing.
    pub skipped: Option<String>,
}

impl GenerateReport {
    /// Total number of generated bones.
    pub fn num_bones(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }

    fn skipped(reason: String) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Generate bone chains along the length of the selected hair cards.
///
/// Each mesh is analyzed on a snapshot; selection changes are not written back.
/// Chains are added to the rig of `config.parent`. Existing chains lying on a
/// new loop are regenerated (or keep their loop, see
/// [`remove_existing_loop_bones`]), and duplicates are removed afterwards.
///
/// The armature is switched to its rest pose for the duration of the call.
pub fn cards_to_bones<S, P, I>(
    skeleton: &mut S,
    meshes: &[&P],
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<GenerateReport>
where
    S: Skeleton + ?Sized,
    P: MeshProvider<I> + ?Sized,
    I: MeshIndex,
{
    config.validate()?;

    let mut loops = Vec::new();
    for (i, provider) in meshes.iter().enumerate() {
        progress.report(i, meshes.len(), "Extracting card loops");
        let mut mesh = provider.snapshot()?;
        loops.extend(cards_to_length_loops(&mut mesh, config)?);
    }
    info!("{} length loops from {} meshes", loops.len(), meshes.len());

    loops_to_bones(skeleton, loops, config, progress)
}

/// Generate bone chains along drawn strokes.
///
/// Strokes whose ends meet are joined first; see
/// [`strokes_to_loops`](crate::algo::strokes::strokes_to_loops).
pub fn strokes_to_bones<S: Skeleton + ?Sized>(
    skeleton: &mut S,
    strokes: &[Vec<Point3<f64>>],
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<GenerateReport> {
    config.validate()?;
    let loops = strokes_to_loops(strokes, config.bone_length);
    info!("{} loops from {} strokes", loops.len(), strokes.len());
    loops_to_bones(skeleton, loops, config, progress)
}

fn loops_to_bones<S: Skeleton + ?Sized>(
    skeleton: &mut S,
    loops: Vec<Vec<Point3<f64>>>,
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<GenerateReport> {
    let previous = reset_pose(skeleton);
    let result = {
        let mut session = EditSession::begin(skeleton);
        generate_chains(&mut session, loops, config, progress)
    };
    restore_pose(skeleton, previous);
    result
}

fn generate_chains<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    mut loops: Vec<Vec<Point3<f64>>>,
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<GenerateReport> {
    let repaired = repair_orphaned_hair_bones(session)?;

    if !can_place_hair_rig(&**session, config.parent) {
        let reason = format!("no {:?} rig root or anchor bone in armature", config.parent);
        warn!("{}, no bones generated", reason);
        let mut report = GenerateReport::skipped(reason);
        report.repaired = repaired;
        return Ok(report);
    }

    let regenerated = remove_existing_loop_bones(session, &mut loops, config.bone_mode)?;
    session.deselect_all()?;

    let prefix = config.parent.bone_prefix();
    let mut chains = Vec::with_capacity(loops.len());
    let mut loop_index = 1;

    for (i, points) in loops.iter().enumerate() {
        progress.report(i, loops.len(), "Generating bone chains");
        loop_index = find_unused_hair_bone_index(&**session, loop_index, prefix);
        let bones = loop_to_bones(
            session,
            config.parent,
            points,
            loop_index,
            config.bone_length,
            config.skip_length,
        )?;
        if !bones.is_empty() {
            loop_index += 1;
            chains.push(bones);
        }
    }
    progress.report(loops.len(), loops.len(), "Generating bone chains");

    let duplicates = remove_duplicate_bones(session, DUPLICATE_TOLERANCE)?;
    info!(
        "generated {} chains, removed {} duplicate bones",
        chains.len(),
        duplicates.len()
    );

    Ok(GenerateReport {
        chains,
        regenerated,
        duplicates,
        repaired,
        skipped: None,
    })
}

/// Add a single upward-pointing bone chain to the rig of `config.parent`.
///
/// Returns the new bone's name, or `None` (logged) when the armature has no
/// anchor bone for the parent.
pub fn add_custom_bone<S: Skeleton + ?Sized>(
    skeleton: &mut S,
    config: &HairRigConfig,
) -> Result<Option<String>> {
    let previous = reset_pose(skeleton);
    let result = {
        let mut session = EditSession::begin(skeleton);
        insert_custom_bone(&mut session, config.parent)
    };
    restore_pose(skeleton, previous);
    result
}

fn insert_custom_bone<S: Skeleton + ?Sized>(
    session: &mut EditSession<'_, S>,
    parent: RigParent,
) -> Result<Option<String>> {
    if !can_place_hair_rig(&**session, parent) {
        warn!("no {:?} rig root or anchor bone in armature, custom bone not added", parent);
        return Ok(None);
    }
    session.deselect_all()?;
    let index = find_unused_hair_bone_index(&**session, 1, parent.bone_prefix());
    custom_bone(session, parent, index, CUSTOM_BONE_LENGTH).map(Some)
}

/// Remove hair bones and their weight groups.
///
/// In [`BoneSelection::Selected`] mode the chains with a selected bone are
/// removed; in [`BoneSelection::All`] mode every hair bone except the rig
/// roots. Rig roots left without children are removed too. Returns the removed
/// bone names.
pub fn remove_hair_bones<S, W>(skeleton: &mut S, stores: &mut [&mut W], mode: BoneSelection) -> Result<Vec<String>>
where
    S: Skeleton + ?Sized,
    W: WeightStore + ?Sized,
{
    let names: Vec<String> = match mode {
        BoneSelection::Selected => collect_bone_chains(&*skeleton, mode)
            .into_iter()
            .flatten()
            .map(|def| def.name)
            .collect(),
        BoneSelection::All => skeleton
            .bone_names()
            .into_iter()
            .filter(|n| is_hair_bone(n) && !is_hair_rig_bone(n))
            .collect(),
    };

    let mut removed = Vec::with_capacity(names.len());
    {
        let mut session = EditSession::begin(skeleton);
        for name in &names {
            if session.contains(name) {
                session.remove_bone(name)?;
                removed.push(name.clone());
            }
        }
        for parent in RigParent::ALL {
            if let Some(rig) = hair_rig(&*session, parent) {
                if session.children(&rig.name).is_empty() {
                    session.remove_bone(&rig.name)?;
                    removed.push(rig.name);
                }
            }
        }
    }

    for store in stores.iter_mut() {
        remove_hair_bone_weights(&mut **store, Some(names.as_slice()), 1.0)?;
    }

    info!("removed {} hair bones", removed.len());
    Ok(removed)
}
