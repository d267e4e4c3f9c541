//! Hair rigs: bone chains generated from hair cards or strokes.
//!
//! This module owns everything that touches a skeleton. The host's armature is
//! reached through the [`Skeleton`] trait, and all changes are made inside an
//! [`EditSession`].
//!
//! # Layout
//!
//! A generated rig hangs from a rig root bone per anatomical parent (head or
//! jaw). Each chain root is a direct child of its rig root; later bones of the
//! chain follow single-child links down to the tip:
//!
//! ```text
//! CC_Base_Head
//! └── RL_Hair_Rig_Head
//!     ├── RL_Hair_1_0 ── RL_Hair_1_1 ── RL_Hair_1_2
//!     └── RL_Hair_2_0 ── RL_Hair_2_1
//! ```
//!
//! # Example
//!
//! ```
//! use tress::rig::{cards_to_bones, Armature, Bone, Skeleton};
//! use tress::config::{CardSelection, HairRigConfig};
//! use tress::mesh::{build_from_polygons, CardMesh};
//! use tress::algo::Progress;
//! use nalgebra::{Point2, Point3};
//!
//! let mut armature = Armature::default();
//! armature
//!     .insert_bone(Bone::new("CC_Base_Head", Point3::new(0.0, 0.0, 1.6), Point3::new(0.0, 0.0, 1.8)))
//!     .unwrap();
//!
//! // one card: a 1x2 quad strip hanging down from the crown
//! let vertices: Vec<Point3<f64>> = (0..3)
//!     .flat_map(|j| (0..2).map(move |i| Point3::new(0.01 * i as f64, -0.1, 1.8 - 0.1 * j as f64)))
//!     .collect();
//! let faces = vec![vec![0, 2, 3, 1], vec![2, 4, 5, 3]];
//! let uv = |v: usize| Point2::new((v % 2) as f64 * 0.05, 1.0 - (v / 2) as f64 * 0.5);
//! let uvs = faces.iter().flatten().map(|&v| uv(v)).collect();
//! let mesh: CardMesh = build_from_polygons(&vertices, &faces, vec![uvs], None).unwrap();
//!
//! let config = HairRigConfig::default()
//!     .with_card_mode(CardSelection::All)
//!     .with_bone_length(0.1)
//!     .with_skip_length(0.0);
//! let report = cards_to_bones(&mut armature, &[&mesh], &config, &Progress::none()).unwrap();
//! assert_eq!(report.chains.len(), 1);
//! assert!(armature.contains("RL_Hair_1_0"));
//! ```

mod armature;
pub mod chain;
pub mod cleanup;
pub mod naming;
mod ops;
pub mod root;
mod skeleton;

pub use armature::Armature;
pub use chain::{collect_bone_chains, BoneChain, BoneDef};
pub use cleanup::{remove_duplicate_bones, remove_existing_loop_bones, repair_orphaned_hair_bones};
pub use naming::{is_hair_bone, is_hair_rig_bone};
pub use ops::{
    add_custom_bone, cards_to_bones, remove_hair_bones, strokes_to_bones, GenerateReport,
    CUSTOM_BONE_LENGTH,
};
pub use root::{can_place_hair_rig, ensure_hair_rig, hair_rig};
pub use skeleton::{reset_pose, restore_pose, Bone, EditSession, PosePosition, Skeleton};
