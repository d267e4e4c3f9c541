//! Mesh construction utilities.
//!
//! This module provides functions for building [`CardMesh`] values from
//! face-vertex lists with per-corner UV layers, as supplied by a host
//! application or read from mesh files.

use std::collections::HashMap;

use nalgebra::{Matrix4, Point2, Point3};

use super::card_mesh::{CardMesh, Edge, Face};
use super::index::{CornerId, EdgeId, MeshIndex, VertexId};
use crate::error::{Result, TressError};

/// Build a card mesh from vertices, polygons and per-corner UV layers.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `polygons` - List of faces, each a list of at least three vertex indices
/// * `uv_layers` - UV channels; each holds one coordinate per corner, in face order
/// * `materials` - Optional material index per face (defaults to 0)
///
/// Every face starts out selected.
///
/// # Example
/// ```
/// use tress::mesh::{build_from_polygons, CardMesh};
/// use nalgebra::{Point2, Point3};
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let uvs = vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ];
/// let mesh: CardMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]], vec![uvs], None).unwrap();
/// assert_eq!(mesh.num_edges(), 4);
/// ```
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    polygons: &[Vec<usize>],
    uv_layers: Vec<Vec<Point2<f64>>>,
    materials: Option<&[usize]>,
) -> Result<CardMesh<I>> {
    if polygons.is_empty() {
        return Err(TressError::EmptyMesh);
    }

    // Validate vertex indices and corner counts
    let mut num_corners = 0;
    for (fi, poly) in polygons.iter().enumerate() {
        if poly.len() < 3 {
            return Err(TressError::DegenerateFace { face: fi });
        }
        for (i, &vi) in poly.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(TressError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if poly[i + 1..].contains(&vi) {
                return Err(TressError::DegenerateFace { face: fi });
            }
        }
        num_corners += poly.len();
    }

    for layer in &uv_layers {
        if layer.len() != num_corners {
            return Err(TressError::CornerCountMismatch {
                expected: num_corners,
                found: layer.len(),
            });
        }
    }

    if let Some(materials) = materials {
        if materials.len() != polygons.len() {
            return Err(TressError::invalid_param(
                "materials",
                materials.len(),
                "must provide one material index per face",
            ));
        }
    }

    let mut corner_vertices = Vec::with_capacity(num_corners);
    let mut corner_edges = Vec::with_capacity(num_corners);
    let mut faces = Vec::with_capacity(polygons.len());
    let mut edges: Vec<Edge<I>> = Vec::new();
    let mut vertex_edges: Vec<Vec<EdgeId<I>>> = vec![Vec::new(); vertices.len()];

    // Map from undirected edge (min, max) to edge ID
    let mut edge_map: HashMap<(usize, usize), EdgeId<I>> = HashMap::new();

    for (fi, poly) in polygons.iter().enumerate() {
        let first_corner = CornerId::<I>::new(corner_vertices.len());
        let n = poly.len();

        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            let key = (a.min(b), a.max(b));

            let edge_id = *edge_map.entry(key).or_insert_with(|| {
                let id = EdgeId::<I>::new(edges.len());
                edges.push(Edge {
                    vertices: [VertexId::new(key.0), VertexId::new(key.1)],
                });
                vertex_edges[key.0].push(id);
                vertex_edges[key.1].push(id);
                id
            });

            corner_vertices.push(VertexId::new(a));
            corner_edges.push(edge_id);
        }

        faces.push(Face {
            first_corner,
            num_corners: n,
            material: materials.map_or(0, |m| m[fi]),
            selected: true,
        });
    }

    Ok(CardMesh {
        positions: vertices.to_vec(),
        corner_vertices,
        corner_edges,
        faces,
        edges,
        vertex_edges,
        uv_layers,
        world: Matrix4::identity(),
    })
}

/// Build a card mesh from vertices, triangles and a single UV layer.
///
/// `uvs` holds one coordinate per triangle corner (three per face, in order).
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    uvs: Vec<Point2<f64>>,
) -> Result<CardMesh<I>> {
    let polygons: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
    build_from_polygons(vertices, &polygons, vec![uvs], None)
}

/// Convert a card mesh back to face-vertex form.
///
/// Returns the vertex positions and the polygon vertex lists.
pub fn to_face_vertex<I: MeshIndex>(mesh: &CardMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let polygons = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();
    (mesh.positions.clone(), polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_uvs(n: usize) -> Vec<Point2<f64>> {
        (0..n).map(|i| Point2::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_shared_edges_are_merged() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mesh: CardMesh = build_from_triangles(&vertices, &faces, strip_uvs(6)).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.vertex_edges(VertexId::new(0)).len(), 3);
        assert!(mesh.is_triangle_mesh());
    }

    #[test]
    fn test_empty_mesh() {
        let result: Result<CardMesh> = build_from_polygons(&[], &[], vec![], None);
        assert!(matches!(result, Err(TressError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let result: Result<CardMesh> =
            build_from_triangles(&vertices, &[[0, 1, 5]], strip_uvs(3));
        assert!(matches!(
            result,
            Err(TressError::InvalidVertexIndex { face: 0, vertex: 5 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result: Result<CardMesh> =
            build_from_triangles(&vertices, &[[0, 1, 1]], strip_uvs(3));
        assert!(matches!(result, Err(TressError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_uv_corner_mismatch() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let result: Result<CardMesh> = build_from_triangles(&vertices, &[[0, 1, 2]], strip_uvs(2));
        assert!(matches!(
            result,
            Err(TressError::CornerCountMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn test_round_trip_face_vertex() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let polys = vec![vec![0, 1, 2, 3]];
        let mesh: CardMesh = build_from_polygons(&vertices, &polys, vec![strip_uvs(4)], Some(&[2])).unwrap();
        let (v, p) = to_face_vertex(&mesh);
        assert_eq!(v.len(), 4);
        assert_eq!(p, polys);
        assert_eq!(mesh.material(crate::mesh::FaceId::new(0)), 2);
    }
}
