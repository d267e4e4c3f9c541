//! End-to-end rigging of a small hair mesh through the public API.

use tress::prelude::*;
use tress::rig::collect_bone_chains;

const CARDS: usize = 3;
const ROWS: usize = 4;

/// `CARDS` straight cards hanging in front of the head, 2 quads wide and
/// `ROWS` quads long, side by side in UV space.
fn hair_mesh() -> CardMesh {
    let mut vertices = Vec::new();
    let mut polygons = Vec::new();
    let mut uvs = Vec::new();

    for k in 0..CARDS {
        let base = vertices.len();
        let mut vertex_uvs = Vec::new();
        for j in 0..=ROWS {
            for i in 0..=2 {
                let t = j as f64 / ROWS as f64;
                vertices.push(Point3::new(k as f64 * 0.05 + i as f64 * 0.01, -0.1, 1.8 - 0.2 * t));
                vertex_uvs.push(Point2::new(k as f64 * 0.1 + i as f64 * 0.025, 1.0 - t));
            }
        }
        for j in 0..ROWS {
            for i in 0..2 {
                let quad = [
                    base + j * 3 + i,
                    base + (j + 1) * 3 + i,
                    base + (j + 1) * 3 + i + 1,
                    base + j * 3 + i + 1,
                ];
                uvs.extend(quad.iter().map(|&v| vertex_uvs[v - base]));
                polygons.push(quad.to_vec());
            }
        }
    }

    build_from_polygons(&vertices, &polygons, vec![uvs], None).unwrap()
}

fn head_armature() -> Armature {
    let mut armature = Armature::default();
    armature
        .insert_bone(Bone::new(
            "CC_Base_Head",
            Point3::new(0.0, 0.0, 1.6),
            Point3::new(0.0, 0.0, 1.8),
        ))
        .unwrap();
    armature
}

fn config() -> HairRigConfig {
    HairRigConfig::default()
        .with_card_mode(CardSelection::All)
        .with_bone_mode(BoneSelection::All)
        .with_bone_length(0.1)
        .with_skip_length(0.0)
}

fn rig_and_bind(config: &HairRigConfig) -> (Armature, WeightMap) {
    let mesh = hair_mesh();
    let mut armature = head_armature();
    cards_to_bones(&mut armature, &[&mesh], config, &Progress::none()).unwrap();

    let mut weights: WeightMap = WeightMap::new();
    {
        let mut targets = [BindTarget::new(&mesh, &mut weights)];
        bind_cards_to_bones(&mut armature, &mut targets, config, &Progress::none()).unwrap();
    }
    (armature, weights)
}

#[test]
fn test_every_card_gets_a_chain_and_weights() {
    let config = config();
    let (armature, weights) = rig_and_bind(&config);

    let chains = collect_bone_chains(&armature, BoneSelection::All);
    assert_eq!(chains.len(), CARDS);
    assert!(chains.iter().all(|c| c.len() == 2));
    assert_eq!(armature.pose_position(), PosePosition::Pose);

    let mesh = hair_mesh();
    for v in mesh.vertex_ids() {
        let groups = weights.groups_of(v);
        assert!(groups.iter().all(|(_, w)| (0.0..=1.0).contains(w)));
        // below the root row every vertex hangs on some hair bone
        if v.index() % ((ROWS + 1) * 3) >= 3 {
            assert!(groups.iter().any(|(_, w)| *w > 0.0), "vertex {:?} unweighted", v);
        }
    }
}

#[test]
fn test_parallel_and_sequential_bind_agree() {
    let (_, parallel) = rig_and_bind(&config().with_seed(11));
    let (_, sequential) = rig_and_bind(&config().with_seed(11).sequential());
    assert_eq!(parallel, sequential);
}

#[test]
fn test_seed_changes_weights() {
    let (_, a) = rig_and_bind(&config().with_seed(1));
    let (_, b) = rig_and_bind(&config().with_seed(2));
    assert_ne!(a, b);
}

#[test]
fn test_duplicate_cards_yield_one_chain_each() {
    let mesh = hair_mesh();
    let mut armature = head_armature();

    let report = cards_to_bones(&mut armature, &[&mesh, &mesh], &config(), &Progress::none()).unwrap();
    assert_eq!(report.duplicates.len(), CARDS * 2);
    assert_eq!(collect_bone_chains(&armature, BoneSelection::All).len(), CARDS);

    // binding again finds nothing left to remove
    let mut weights: WeightMap = WeightMap::new();
    let mut targets = [BindTarget::new(&mesh, &mut weights)];
    let bound = bind_cards_to_bones(&mut armature, &mut targets, &config(), &Progress::none()).unwrap();
    assert!(bound.duplicates.is_empty());
    assert_eq!(bound.cards, CARDS);
}

#[test]
fn test_spring_rig_is_an_accessory() {
    let config = config().with_rig_target(RigTarget::Spring).with_max_weight(0.9);
    let (armature, weights) = rig_and_bind(&config);

    assert!(weights.group_names().iter().all(|n| tress::rig::is_hair_bone(n)));
    for chain in collect_bone_chains(&armature, BoneSelection::All) {
        assert!(armature.is_pose_locked(&chain[0].name));
    }
}
