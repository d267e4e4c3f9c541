//! Smoothing hair weights across the card surface.

use log::debug;

use super::store::WeightStore;
use crate::algo::smooth::{laplacian_smooth_values, SmoothOptions};
use crate::config::RigPolicy;
use crate::error::Result;
use crate::mesh::{CardMesh, MeshIndex, VertexId};
use crate::rig::{BoneChain, Skeleton};

/// Smooth the weight group of every bone in `chains` over mesh edges.
///
/// Each group is smoothed on its own with a blend factor of 1.0, so a vertex
/// takes the mean of its neighbors on every pass. Only `movable` vertices (all
/// when `None`) change. A vertex gains a group only when its smoothed weight is
/// positive.
pub fn smooth_hair_weights<W, I>(
    mesh: &CardMesh<I>,
    store: &mut W,
    chains: &[BoneChain],
    movable: Option<&[bool]>,
    options: &SmoothOptions,
) -> Result<()>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    if options.iterations == 0 {
        return Ok(());
    }

    let num_vertices = mesh.num_vertices();
    let mut smoothed = 0;

    for bone in chains.iter().flatten() {
        if !store.has_group(&bone.name) {
            continue;
        }

        let existing: Vec<Option<f64>> = (0..num_vertices)
            .map(|i| store.weight(&bone.name, VertexId::new(i)))
            .collect();
        let mut values: Vec<f64> = existing.iter().map(|w| w.unwrap_or(0.0)).collect();

        laplacian_smooth_values(mesh, &mut values, movable, options);

        for (i, (&value, before)) in values.iter().zip(&existing).enumerate() {
            if before.is_some() || value > 0.0 {
                store.set_weight(&bone.name, VertexId::new(i), value)?;
            }
        }
        smoothed += 1;
    }

    debug!("smoothed {} weight groups, {} passes", smoothed, options.iterations);
    Ok(())
}

/// Lock or unlock the root bone of every chain as the rig target requires.
pub fn apply_root_lock_policy<S: Skeleton + ?Sized>(
    skeleton: &mut S,
    chains: &[BoneChain],
    policy: &RigPolicy,
) -> Result<()> {
    for root in chains.iter().filter_map(|c| c.first()) {
        if skeleton.contains(&root.name) {
            skeleton.set_pose_lock(&root.name, policy.lock_root_bones)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigTarget;
    use crate::rig::{Armature, Bone, BoneDef};
    use crate::testing::{strip_mesh, StripLayout};
    use crate::weights::WeightMap;
    use nalgebra::Point3;

    fn chain() -> Vec<BoneChain> {
        vec![vec![BoneDef::new("RL_Hair_1_0", Point3::origin(), Point3::new(0.0, 0.0, -1.0))]]
    }

    #[test]
    fn test_smoothing_spreads_within_mask() {
        let mesh = strip_mesh(&[StripLayout::default()]);
        let mut store: WeightMap = WeightMap::new();
        store.set_weight("RL_Hair_1_0", VertexId::new(7), 1.0).unwrap();
        store.set_weight("CC_Base_Head", VertexId::new(7), 1.0).unwrap();

        let mut movable = vec![true; mesh.num_vertices()];
        movable[4] = false;
        let options = SmoothOptions::default().with_iterations(1).sequential();
        smooth_hair_weights(&mesh, &mut store, &chain(), Some(movable.as_slice()), &options).unwrap();

        assert_eq!(store.weight("RL_Hair_1_0", VertexId::new(7)), Some(0.0));
        assert_eq!(store.weight("RL_Hair_1_0", VertexId::new(4)), None);
        assert!(store.weight("RL_Hair_1_0", VertexId::new(10)).unwrap() > 0.0);
        // other groups are left alone
        assert_eq!(store.weight("CC_Base_Head", VertexId::new(7)), Some(1.0));
    }

    #[test]
    fn test_zero_iterations_keeps_weights() {
        let mesh = strip_mesh(&[StripLayout::default()]);
        let mut store: WeightMap = WeightMap::new();
        store.set_weight("RL_Hair_1_0", VertexId::new(7), 1.0).unwrap();
        let before = store.clone();
        let options = SmoothOptions::default().with_iterations(0);
        smooth_hair_weights(&mesh, &mut store, &chain(), None, &options).unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn test_lock_policy() {
        let mut arm = Armature::default();
        arm.insert_bone(Bone::new("RL_Hair_1_0", Point3::origin(), Point3::new(0.0, 0.0, -1.0)))
            .unwrap();

        apply_root_lock_policy(&mut arm, &chain(), &RigTarget::Spring.policy()).unwrap();
        assert!(arm.is_pose_locked("RL_Hair_1_0"));
        apply_root_lock_policy(&mut arm, &chain(), &RigTarget::Standard.policy()).unwrap();
        assert!(!arm.is_pose_locked("RL_Hair_1_0"));
    }
}
