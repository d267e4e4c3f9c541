//! Core mesh data structures.
//!
//! This module provides the polygon mesh representation the hair-card
//! algorithms read from, and the seam through which a host application hands
//! its geometry over.
//!
//! # Overview
//!
//! The primary type is [`CardMesh`]: vertex positions, polygon faces stored as
//! runs of corners, per-corner UV layers, a material index and selection flag
//! per face, and an undirected edge table with per-vertex edge links.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`CornerId`] - Identifies a face corner (and its UV coordinates)
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies an undirected edge
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use tress::mesh::{build_from_triangles, CardMesh};
//! use nalgebra::{Point2, Point3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let uvs = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.5, 1.0)];
//!
//! let mesh: CardMesh = build_from_triangles(&vertices, &[[0, 1, 2]], uvs).unwrap();
//! assert_eq!(mesh.num_edges(), 3);
//! ```

mod builder;
mod card_mesh;
mod index;
mod provider;

pub use builder::{build_from_polygons, build_from_triangles, to_face_vertex};
pub use card_mesh::{CardMesh, Edge, Face};
pub use index::{CornerId, EdgeId, FaceId, MeshIndex, VertexId};
pub use provider::MeshProvider;
