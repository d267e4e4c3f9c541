//! Direction-filtered edge sets and their connectivity.

use std::collections::{HashMap, HashSet};

use nalgebra::Vector2;

use crate::algo::islands::Island;
use crate::algo::uv_map::UvMap;
use crate::error::{Result, TressError};
use crate::mesh::{CardMesh, EdgeId, MeshIndex, VertexId};

/// Which edges of an island to keep relative to the card direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAlignment {
    /// Edges running along the card (`|cos| >= threshold`).
    Aligned,
    /// Edges running across the card (`|cos| < threshold`).
    Lateral,
}

/// Edge adjacency restricted to a filtered edge set.
pub type EdgeAdjacency<I> = HashMap<EdgeId<I>, Vec<EdgeId<I>>>;

/// Collect the island's edges whose UV direction is aligned with (or lateral to) `dir`.
///
/// `dir` is normalized internally. An edge whose UV endpoints coincide has no
/// direction and counts as lateral. Edges are returned in face order.
pub fn uv_aligned_edges<I: MeshIndex>(
    mesh: &CardMesh<I>,
    island: &Island<I>,
    uv_map: &UvMap<I>,
    dir: &Vector2<f64>,
    threshold: f64,
    alignment: EdgeAlignment,
) -> Result<Vec<EdgeId<I>>> {
    let dir = dir.try_normalize(f64::EPSILON).ok_or_else(|| {
        TressError::invalid_param("dir", format!("{:?}", dir), "must be non-zero")
    })?;

    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for &f in island.faces() {
        for e in mesh.face_edges(f) {
            if !seen.insert(e) {
                continue;
            }
            let [v0, v1] = mesh.edge(e).vertices;
            let (Some(uv0), Some(uv1)) = (uv_map.get(v0), uv_map.get(v1)) else {
                continue;
            };
            let dot = (uv1 - uv0)
                .try_normalize(0.0)
                .map_or(0.0, |uv_dir| dir.dot(&uv_dir));

            let keep = match alignment {
                EdgeAlignment::Aligned => dot.abs() >= threshold,
                EdgeAlignment::Lateral => dot.abs() < threshold,
            };
            if keep {
                kept.push(e);
            }
        }
    }

    Ok(kept)
}

/// Map each edge to the other edges of the set that share a vertex with it.
///
/// Edges without any linked edge are absent from the map.
pub fn linked_edge_map<I: MeshIndex>(mesh: &CardMesh<I>, edges: &[EdgeId<I>]) -> EdgeAdjacency<I> {
    let in_set: HashSet<EdgeId<I>> = edges.iter().copied().collect();
    let mut map: EdgeAdjacency<I> = HashMap::new();

    for &e in edges {
        for v in mesh.edge(e).vertices {
            for &linked in mesh.vertex_edges(v) {
                if linked != e && in_set.contains(&linked) {
                    let entry = map.entry(e).or_default();
                    if !entry.contains(&linked) {
                        entry.push(linked);
                    }
                }
            }
        }
    }

    map
}

/// Partition an edge set into connected chains and return each chain's vertices.
///
/// Chains are grown by frontier expansion over `adjacency`. The vertices of a
/// chain come back in discovery order, without duplicates and unsorted.
pub fn edge_vertex_loops<I: MeshIndex>(
    mesh: &CardMesh<I>,
    edges: &[EdgeId<I>],
    adjacency: &EdgeAdjacency<I>,
) -> Vec<Vec<VertexId<I>>> {
    let mut remaining: HashSet<EdgeId<I>> = edges.iter().copied().collect();
    let mut loops = Vec::new();

    for &seed in edges {
        if !remaining.remove(&seed) {
            continue;
        }

        let mut vertices = Vec::new();
        let mut visited_vertices = HashSet::new();
        let mut frontier = vec![seed];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for e in frontier {
                for v in mesh.edge(e).vertices {
                    if visited_vertices.insert(v) {
                        vertices.push(v);
                    }
                }
                if let Some(linked) = adjacency.get(&e) {
                    for &le in linked {
                        if remaining.remove(&le) {
                            next.push(le);
                        }
                    }
                }
            }
            frontier = next;
        }

        loops.push(vertices);
    }

    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::islands::{island_uv_map, uv_islands};
    use crate::testing::{strip_mesh, StripLayout};

    fn card_edges(alignment: EdgeAlignment) -> (CardMesh, Vec<EdgeId<u32>>) {
        let mesh = strip_mesh(&[StripLayout::default().columns(2).rows(4)]);
        let islands = uv_islands(&mesh, 0, false).unwrap();
        let uv_map = island_uv_map(&mesh, 0, &islands[0]).unwrap();
        let edges = uv_aligned_edges(
            &mesh,
            &islands[0],
            &uv_map,
            &Vector2::new(0.0, -3.0),
            0.9,
            alignment,
        )
        .unwrap();
        (mesh, edges)
    }

    #[test]
    fn test_aligned_and_lateral_partition_edges() {
        let (mesh, aligned) = card_edges(EdgeAlignment::Aligned);
        let (_, lateral) = card_edges(EdgeAlignment::Lateral);

        // 3 columns of 4 vertical edges, 5 rows of 2 horizontal edges
        assert_eq!(aligned.len(), 12);
        assert_eq!(lateral.len(), 10);
        assert_eq!(aligned.len() + lateral.len(), mesh.num_edges());
    }

    #[test]
    fn test_aligned_loops() {
        let (mesh, aligned) = card_edges(EdgeAlignment::Aligned);
        let adjacency = linked_edge_map(&mesh, &aligned);
        let loops = edge_vertex_loops(&mesh, &aligned, &adjacency);
        assert_eq!(loops.len(), 3);
        assert!(loops.iter().all(|l| l.len() == 5));
    }

    #[test]
    fn test_lateral_loops() {
        let (mesh, lateral) = card_edges(EdgeAlignment::Lateral);
        let adjacency = linked_edge_map(&mesh, &lateral);
        let loops = edge_vertex_loops(&mesh, &lateral, &adjacency);
        assert_eq!(loops.len(), 5);
        assert!(loops.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn test_isolated_edge_has_no_links() {
        let mesh = strip_mesh(&[StripLayout::default().columns(1).rows(1)]);
        let islands = uv_islands(&mesh, 0, false).unwrap();
        let uv_map = island_uv_map(&mesh, 0, &islands[0]).unwrap();
        let lateral = uv_aligned_edges(
            &mesh,
            &islands[0],
            &uv_map,
            &Vector2::new(0.0, -1.0),
            0.9,
            EdgeAlignment::Lateral,
        )
        .unwrap();
        assert_eq!(lateral.len(), 2);
        assert!(linked_edge_map(&mesh, &lateral).is_empty());
        assert_eq!(edge_vertex_loops(&mesh, &lateral, &HashMap::new()).len(), 2);
    }

    #[test]
    fn test_zero_direction_rejected() {
        let mesh = strip_mesh(&[StripLayout::default()]);
        let islands = uv_islands(&mesh, 0, false).unwrap();
        let uv_map = island_uv_map(&mesh, 0, &islands[0]).unwrap();
        assert!(uv_aligned_edges(
            &mesh,
            &islands[0],
            &uv_map,
            &Vector2::zeros(),
            0.9,
            EdgeAlignment::Aligned
        )
        .is_err());
    }
}
