//! # Tress
//!
//! Hair-card topology analysis, bone-chain generation and skin-weight binding
//! for hair rigs.
//!
//! Game and real-time hair is built from *cards*: narrow quad strips, each its
//! own UV island, whose UV layout runs from root to tip along a known
//! direction. Tress reads that layout back out of the mesh, grows a chain of
//! bones along every card and binds the card vertices to the nearest chains.
//!
//! ## Features
//!
//! - **UV islands**: partition faces into UV-connected islands
//! - **Card topology**: aligned (root to tip) and lateral (across) vertex loops per card
//! - **Bone chains**: fixed-length bones grown along card loops or drawn strokes,
//!   parented under a hair rig root on the head or jaw
//! - **Weights**: distance falloff weights with seeded variance and Laplacian smoothing
//! - **Host seams**: [`mesh::MeshProvider`], [`weights::WeightStore`] and
//!   [`rig::Skeleton`] traits, with in-memory implementations
//!
//! ## Quick Start
//!
//! ```no_run
//! use tress::prelude::*;
//!
//! let mesh: CardMesh = tress::io::load("hair.obj").unwrap();
//! let mut armature = Armature::default();
//! armature
//!     .insert_bone(Bone::new(
//!         "CC_Base_Head",
//!         Point3::new(0.0, 0.0, 1.6),
//!         Point3::new(0.0, 0.0, 1.8),
//!     ))
//!     .unwrap();
//!
//! let config = HairRigConfig::default().with_card_mode(CardSelection::All);
//! cards_to_bones(&mut armature, &[&mesh], &config, &Progress::none()).unwrap();
//!
//! let mut weights: WeightMap = WeightMap::new();
//! let mut targets = [BindTarget::new(&mesh, &mut weights)];
//! let report = bind_cards_to_bones(&mut armature, &mut targets, &config, &Progress::none()).unwrap();
//! println!("{} cards bound to {} chains", report.cards, report.chains);
//! ```
//!
//! ## Card Loops
//!
//! ```
//! use tress::prelude::*;
//! use tress::algo::cards::cards_to_length_loops;
//!
//! // a single quad card, UV v running from 1 at the root to 0 at the tip
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.01, 0.0, 0.0),
//!     Point3::new(0.01, 0.0, -0.1),
//!     Point3::new(0.0, 0.0, -0.1),
//! ];
//! let uvs = vec![
//!     Point2::new(0.0, 1.0),
//!     Point2::new(0.1, 1.0),
//!     Point2::new(0.1, 0.0),
//!     Point2::new(0.0, 0.0),
//! ];
//! let mut mesh: CardMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]], vec![uvs], None).unwrap();
//!
//! let config = HairRigConfig::default().with_card_mode(CardSelection::All);
//! let loops = cards_to_length_loops(&mut mesh, &config).unwrap();
//! assert_eq!(loops.len(), 1);
//! assert!(loops[0][0].z > loops[0][1].z);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod rig;
pub mod weights;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tress::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::Progress;
    pub use crate::config::{
        BoneSelection, CardSelection, HairRigConfig, RigParent, RigPolicy, RigTarget,
    };
    pub use crate::error::{Result, TressError};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, CardMesh, EdgeId, FaceId, MeshIndex,
        MeshProvider, VertexId,
    };
    pub use crate::rig::{
        cards_to_bones, strokes_to_bones, Armature, Bone, BoneChain, EditSession, PosePosition,
        Skeleton,
    };
    pub use crate::weights::{bind_cards_to_bones, BindTarget, WeightMap, WeightStore};
    pub use nalgebra::{Point2, Point3, Vector2, Vector3};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
