//! Hair card analysis algorithms.
//!
//! This module contains the mesh-side algorithms, leaf first:
//!
//! - **UV islands**: partitioning faces into UV-connected islands
//! - **Cards**: aligned and lateral edge loops of each island, ordered root to tip
//! - **Polylines**: loop length, evaluation and proximity, subdivision and smoothing
//! - **Strokes**: joining drawn strokes into hair loops
//! - **Smoothing**: Laplacian smoothing of per-vertex values
//! - **Transfer**: copying vertex positions between meshes by UV-ID
//!
//! Skeleton-side operations live in [`crate::rig`], weights in [`crate::weights`].

pub mod cards;
pub mod islands;
pub mod polyline;
pub mod progress;
pub mod smooth;
pub mod strokes;
pub mod transfer;
pub mod uv_map;

pub use progress::Progress;
