//! Binding hair meshes to their bone chains.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::assign::assign_bones;
use super::maintenance::{convert_to_accessory, remove_hair_bone_weights, scale_existing_weights};
use super::smooth::{apply_root_lock_policy, smooth_hair_weights};
use super::store::WeightStore;
use crate::algo::cards::lateral_cards;
use crate::algo::smooth::SmoothOptions;
use crate::algo::Progress;
use crate::config::{BoneSelection, HairRigConfig};
use crate::error::Result;
use crate::mesh::{CardMesh, MeshIndex, MeshProvider};
use crate::rig::cleanup::DUPLICATE_TOLERANCE;
use crate::rig::{
    collect_bone_chains, remove_duplicate_bones, repair_orphaned_hair_bones, reset_pose, BoneChain,
    EditSession, PosePosition, Skeleton,
};

/// A hair mesh and the weight groups it is bound through.
#[derive(Debug)]
pub struct BindTarget<'a, P: ?Sized, W: ?Sized> {
    /// Geometry source; read through a snapshot.
    pub mesh: &'a P,
    /// Weight groups to write.
    pub weights: &'a mut W,
}

impl<'a, P: ?Sized, W: ?Sized> BindTarget<'a, P, W> {
    /// Pair a mesh with its weights.
    pub fn new(mesh: &'a P, weights: &'a mut W) -> Self {
        Self { mesh, weights }
    }
}

/// Outcome of [`bind_cards_to_bones`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindReport {
    /// Number of bone chains bound to.
    pub chains: usize,
    /// Number of cards weighted, over all meshes.
    pub cards: usize,
    /// Bones removed as duplicates before binding.
    pub duplicates: Vec<String>,
    /// Non-hair groups removed for accessory export.
    pub accessory_groups_removed: usize,
    /// Set when nothing was bound.
    pub skipped: Option<String>,
}

/// Weight every target's hair cards to the hair bone chains.
///
/// Duplicate chains are removed and stray hair bones repaired first. Per
/// target, the old groups of the chains are removed, existing non-hair weights
/// scaled, and the cards weighted and smoothed. One random generator seeded
/// from `config.seed` serves the whole call, so a fixed seed reproduces the
/// weights exactly. Finally the chains' root bones are locked or unlocked, and
/// spring targets are converted to accessories.
///
/// The armature is left in its pose position.
pub fn bind_cards_to_bones<S, P, W, I>(
    skeleton: &mut S,
    targets: &mut [BindTarget<'_, P, W>],
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<BindReport>
where
    S: Skeleton + ?Sized,
    P: MeshProvider<I> + ?Sized,
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    config.validate()?;
    reset_pose(skeleton);
    let result = bind(skeleton, targets, config, progress);
    skeleton.set_pose_position(PosePosition::Pose);
    result
}

fn bind<S, P, W, I>(
    skeleton: &mut S,
    targets: &mut [BindTarget<'_, P, W>],
    config: &HairRigConfig,
    progress: &Progress,
) -> Result<BindReport>
where
    S: Skeleton + ?Sized,
    P: MeshProvider<I> + ?Sized,
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    let duplicates = {
        let mut session = EditSession::begin(skeleton);
        let duplicates = remove_duplicate_bones(&mut session, DUPLICATE_TOLERANCE)?;
        repair_orphaned_hair_bones(&mut session)?;
        duplicates
    };

    let chains = collect_bone_chains(&*skeleton, config.bone_mode);
    if chains.is_empty() {
        warn!("no hair bone chains to bind to");
        return Ok(BindReport {
            duplicates,
            skipped: Some("no hair bone chains".to_string()),
            ..BindReport::default()
        });
    }
    let names = chain_bone_names(&chains);

    let policy = config.policy();
    let existing_scale = config.effective_existing_scale();
    let smoothing = SmoothOptions::default()
        .with_iterations(config.smoothing_iterations)
        .with_parallel(config.parallel);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut cards_bound = 0;
    let num_targets = targets.len();

    for (i, target) in targets.iter_mut().enumerate() {
        let weights = &mut *target.weights;

        progress.report_sub(0, 3, i, num_targets, "Extracting lateral loops");
        remove_hair_bone_weights(weights, Some(names.as_slice()), existing_scale)?;
        let mut mesh = target.mesh.snapshot()?;
        let cards = lateral_cards(&mut mesh, config)?;

        progress.report_sub(1, 3, i, num_targets, "Assigning weights");
        scale_existing_weights(weights, existing_scale)?;
        cards_bound += assign_bones(weights, &cards, &chains, config, &mut rng)?;

        progress.report_sub(2, 3, i, num_targets, "Smoothing weights");
        let movable = selected_vertices(&mesh);
        smooth_hair_weights(&mesh, weights, &chains, Some(movable.as_slice()), &smoothing)?;
    }
    progress.report(num_targets, num_targets, "Binding hair cards");

    apply_root_lock_policy(skeleton, &chains, &policy)?;

    let accessory_groups_removed = if policy.convert_to_accessory {
        let mut stores: Vec<&mut W> = targets.iter_mut().map(|t| &mut *t.weights).collect();
        convert_to_accessory(&mut stores)?
    } else {
        0
    };

    info!(
        "bound {} cards to {} chains over {} meshes",
        cards_bound,
        chains.len(),
        targets.len()
    );

    Ok(BindReport {
        chains: chains.len(),
        cards: cards_bound,
        duplicates,
        accessory_groups_removed,
        skipped: None,
    })
}

/// Remove the weight groups of the chosen hair chains.
///
/// Returns the chain bone names whose groups were cleared; nothing is removed
/// when no chain matches `mode`. The armature is left in its pose position.
pub fn clear_hair_bone_weights<S, W, I>(
    skeleton: &mut S,
    stores: &mut [&mut W],
    mode: BoneSelection,
) -> Result<Vec<String>>
where
    S: Skeleton + ?Sized,
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    let names = chain_bone_names(&collect_bone_chains(&*skeleton, mode));
    if names.is_empty() {
        info!("no hair bone chains, no weights cleared");
    } else {
        for store in stores.iter_mut() {
            remove_hair_bone_weights(&mut **store, Some(names.as_slice()), 1.0)?;
        }
    }
    skeleton.set_pose_position(PosePosition::Pose);
    Ok(names)
}

fn chain_bone_names(chains: &[BoneChain]) -> Vec<String> {
    chains.iter().flatten().map(|def| def.name.clone()).collect()
}

/// Vertices of the selected faces.
fn selected_vertices<I: MeshIndex>(mesh: &CardMesh<I>) -> Vec<bool> {
    let mut mask = vec![false; mesh.num_vertices()];
    for f in mesh.selected_face_ids() {
        for v in mesh.face_vertices(f) {
            mask[v.index()] = true;
        }
    }
    mask
}
