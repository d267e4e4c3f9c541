//! Hair-card topology extraction.
//!
//! A hair card is a strip of quads textured with a hair clump. Within one UV
//! island, the edges running along the card direction (in UV space) form the
//! card's *length loops*, and the edges running across it form its *lateral
//! loops*. Length loops become bone chains; lateral loops describe how far
//! along the card each vertex sits, which drives weight assignment.
//!
//! # Pipeline
//!
//! 1. [`select_cards`] picks the faces to analyze (whole islands, minus
//!    excluded materials such as the scalp).
//! 2. [`uv_islands`](crate::algo::islands::uv_islands) splits them into cards.
//! 3. [`uv_aligned_edges`] keeps the aligned or lateral edges of an island and
//!    [`linked_edge_map`] / [`edge_vertex_loops`] group them into vertex loops.
//! 4. [`sort_verts_by_uv`] orders length loops root to tip, and
//!    [`lateral_card`] orders lateral loops into a [`Card`].
//!
//! [`cards_to_length_loops`] and [`lateral_cards`] run the whole pipeline.
//!
//! # Example
//!
//! ```
//! use tress::algo::cards::cards_to_length_loops;
//! use tress::config::{CardSelection, HairRigConfig};
//! use tress::mesh::{build_from_polygons, CardMesh};
//! use nalgebra::{Point2, Point3};
//!
//! // A single card: two columns of quads hanging from the root row.
//! let mut vertices = Vec::new();
//! let mut uvs_per_vertex = Vec::new();
//! for j in 0..3 {
//!     for i in 0..3 {
//!         vertices.push(Point3::new(i as f64 * 0.01, 0.0, -(j as f64) * 0.1));
//!         uvs_per_vertex.push(Point2::new(i as f64 * 0.5, 1.0 - j as f64 * 0.5));
//!     }
//! }
//! let mut polygons = Vec::new();
//! let mut uvs = Vec::new();
//! for j in 0..2 {
//!     for i in 0..2 {
//!         let quad = vec![j * 3 + i, (j + 1) * 3 + i, (j + 1) * 3 + i + 1, j * 3 + i + 1];
//!         uvs.extend(quad.iter().map(|&v| uvs_per_vertex[v]));
//!         polygons.push(quad);
//!     }
//! }
//! let mut mesh: CardMesh = build_from_polygons(&vertices, &polygons, vec![uvs], None).unwrap();
//!
//! let config = HairRigConfig::default().with_card_mode(CardSelection::All);
//! let loops = cards_to_length_loops(&mut mesh, &config).unwrap();
//! assert_eq!(loops.len(), 1);
//! assert_eq!(loops[0].len(), 3);
//! assert!(loops[0][0].z > loops[0][2].z);
//! ```

mod edges;
mod loops;

pub use edges::{edge_vertex_loops, linked_edge_map, uv_aligned_edges, EdgeAdjacency, EdgeAlignment};
pub use loops::{
    lateral_card, loop_world_positions, merge_length_loops, sort_verts_by_uv, Card, UvOrder,
};

use log::{debug, info};
use nalgebra::{Point3, Vector2};

use crate::algo::islands::{island_uv_map, select_linked_islands, uv_islands, Island};
use crate::algo::uv_map::UvMap;
use crate::config::{CardSelection, HairRigConfig};
use crate::error::Result;
use crate::mesh::{CardMesh, MeshIndex, VertexId};

/// Select the faces that take part in card analysis.
///
/// In [`CardSelection::Selected`] mode the selection grows to cover every UV
/// island it touches; in [`CardSelection::All`] mode every face is selected.
/// Faces using an excluded material are then deselected. Returns the number of
/// selected faces.
pub fn select_cards<I: MeshIndex>(
    mesh: &mut CardMesh<I>,
    channel: usize,
    mode: CardSelection,
    excluded_materials: &[usize],
) -> Result<usize> {
    match mode {
        CardSelection::All => mesh.select_all(),
        CardSelection::Selected => {
            select_linked_islands(mesh, channel)?;
        }
    }

    for &material in excluded_materials {
        let removed = mesh.deselect_material(material);
        if removed > 0 {
            debug!("deselected {} faces with excluded material {}", removed, material);
        }
    }

    Ok(mesh.selected_face_ids().count())
}

/// Vertex loops of an island, ordered root to tip along `dir`.
pub fn ordered_vertex_loops<I: MeshIndex>(
    mesh: &CardMesh<I>,
    island: &Island<I>,
    uv_map: &UvMap<I>,
    dir: &Vector2<f64>,
    threshold: f64,
) -> Result<Vec<Vec<VertexId<I>>>> {
    let edges = uv_aligned_edges(mesh, island, uv_map, dir, threshold, EdgeAlignment::Aligned)?;
    debug!("{} aligned edges", edges.len());

    let adjacency = linked_edge_map(mesh, &edges);
    Ok(edge_vertex_loops(mesh, &edges, &adjacency)
        .iter()
        .map(|l| sort_verts_by_uv(l, uv_map, dir))
        .collect())
}

/// Extract the length loops of the selected cards as world-space polylines.
///
/// With `merge_loops`, each card yields one averaged polyline; a card whose
/// loops differ in vertex count is not merged and contributes its loops
/// individually. Without it every length loop is returned.
pub fn cards_to_length_loops<I: MeshIndex>(
    mesh: &mut CardMesh<I>,
    config: &HairRigConfig,
) -> Result<Vec<Vec<Point3<f64>>>> {
    let dir = config.unit_card_dir()?;
    let channel = config.uv_channel;

    select_cards(mesh, channel, config.card_mode, &config.excluded_materials)?;
    let islands = uv_islands(mesh, channel, true)?;
    info!("{} islands selected", islands.len());

    let mut all_loops = Vec::new();
    let mut unmerged = 0;

    for island in &islands {
        debug!("processing island, faces: {}", island.len());
        let uv_map = island_uv_map(mesh, channel, island)?;
        let loops: Vec<Vec<Point3<f64>>> =
            ordered_vertex_loops(mesh, island, &uv_map, &dir, config.dir_threshold)?
                .iter()
                .map(|l| loop_world_positions(mesh, l))
                .collect();
        debug!("{} ordered loops", loops.len());

        if config.merge_loops {
            match merge_length_loops(&loops) {
                Some(merged) => all_loops.push(merged),
                None => {
                    debug!("loops have differing lengths, keeping them separate");
                    unmerged += 1;
                    all_loops.extend(loops);
                }
            }
        } else {
            all_loops.extend(loops);
        }
    }

    if unmerged > 0 {
        info!("{} islands not merged: loops have differing lengths", unmerged);
    }

    Ok(all_loops)
}

/// Describe the selected cards by their lateral loops.
///
/// Islands yielding fewer than two lateral loops cannot be measured along
/// their length and are skipped.
pub fn lateral_cards<I: MeshIndex>(
    mesh: &mut CardMesh<I>,
    config: &HairRigConfig,
) -> Result<Vec<Card<I>>> {
    let dir = config.unit_card_dir()?;
    let channel = config.uv_channel;

    select_cards(mesh, channel, config.card_mode, &config.excluded_materials)?;
    let islands = uv_islands(mesh, channel, true)?;
    info!("{} islands selected", islands.len());

    let mut cards = Vec::with_capacity(islands.len());
    let mut skipped = 0;

    for island in &islands {
        let uv_map = island_uv_map(mesh, channel, island)?;
        let edges = uv_aligned_edges(
            mesh,
            island,
            &uv_map,
            &dir,
            config.dir_threshold,
            EdgeAlignment::Lateral,
        )?;
        let adjacency = linked_edge_map(mesh, &edges);
        let vert_loops = edge_vertex_loops(mesh, &edges, &adjacency);
        debug!(
            "island of {} faces: {} lateral edges, {} lateral loops",
            island.len(),
            edges.len(),
            vert_loops.len()
        );

        let card = lateral_card(mesh, vert_loops, &uv_map, &dir);
        if card.len() < 2 {
            skipped += 1;
            continue;
        }
        cards.push(card);
    }

    if skipped > 0 {
        info!("{} islands skipped: fewer than two lateral loops", skipped);
    }

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{strip_mesh, StripLayout};
    use approx::assert_relative_eq;

    fn all_cards() -> HairRigConfig {
        HairRigConfig::default().with_card_mode(CardSelection::All)
    }

    #[test]
    fn test_merged_length_loops() {
        let mut mesh = strip_mesh(&[
            StripLayout::default(),
            StripLayout::default().offset(0.1, 0.2).columns(3).rows(6),
        ]);
        let loops = cards_to_length_loops(&mut mesh, &all_cards()).unwrap();
        assert_eq!(loops.len(), 2);

        let mut lengths: Vec<usize> = loops.iter().map(|l| l.len()).collect();
        lengths.sort();
        assert_eq!(lengths, vec![5, 7]);

        for l in &loops {
            // root first, hanging down
            assert_relative_eq!(l[0].z, 0.0, epsilon = 1e-12);
            assert!(l.windows(2).all(|w| w[1].z < w[0].z));
        }
    }

    #[test]
    fn test_unmerged_length_loops() {
        let mut mesh = strip_mesh(&[StripLayout::default().columns(2).rows(4)]);
        let config = all_cards().with_merge_loops(false);
        let loops = cards_to_length_loops(&mut mesh, &config).unwrap();
        assert_eq!(loops.len(), 3);
        assert!(loops.iter().all(|l| l.len() == 5));
    }

    #[test]
    fn test_uneven_card_keeps_loops_when_merging() {
        use crate::mesh::build_from_polygons;

        // Left column has 3 quads, right column one pentagon: aligned loops of 4, 4 and 2 points.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.01, 0.0, 0.0),
            Point3::new(0.02, 0.0, 0.0),
            Point3::new(0.0, 0.0, -0.1),
            Point3::new(0.01, 0.0, -0.1),
            Point3::new(0.0, 0.0, -0.2),
            Point3::new(0.01, 0.0, -0.2),
            Point3::new(0.02, 0.0, -0.2),
            Point3::new(0.0, 0.0, -0.3),
            Point3::new(0.01, 0.0, -0.3),
        ];
        let uv = |v: usize| {
            let p = vertices[v];
            nalgebra::Point2::new(p.x * 10.0, 1.0 + p.z)
        };
        let polygons = vec![
            vec![0, 3, 4, 1],
            vec![3, 5, 6, 4],
            vec![5, 8, 9, 6],
            vec![1, 4, 6, 7, 2],
        ];
        let uvs = polygons.iter().flatten().map(|&v| uv(v)).collect();
        let mut mesh: CardMesh = build_from_polygons(&vertices, &polygons, vec![uvs], None).unwrap();

        for merge in [true, false] {
            let config = all_cards().with_merge_loops(merge);
            let loops = cards_to_length_loops(&mut mesh, &config).unwrap();
            let mut lengths: Vec<usize> = loops.iter().map(|l| l.len()).collect();
            lengths.sort();
            assert_eq!(lengths, vec![2, 4, 4], "merge_loops = {}", merge);
        }
    }

    #[test]
    fn test_lateral_cards() {
        let mut mesh = strip_mesh(&[StripLayout::default().columns(2).rows(4)]);
        let cards = lateral_cards(&mut mesh, &all_cards()).unwrap();
        assert_eq!(cards.len(), 1);

        let card = &cards[0];
        assert_eq!(card.len(), 5);
        assert_eq!(card.loops.len(), 5);
        assert!(card.loops.iter().all(|l| l.len() == 3));
        for (i, p) in card.median.iter().enumerate() {
            assert_relative_eq!(*p, Point3::new(0.01, 0.0, -0.05 * i as f64), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_selection_expands_and_excludes() {
        let mut mesh = strip_mesh(&[
            StripLayout::default(),
            StripLayout::default().offset(0.1, 0.2),
            StripLayout::default().offset(0.2, 0.4).material(1),
        ]);
        let faces_per_card = mesh.num_faces() / 3;
        for f in mesh.face_ids().collect::<Vec<_>>() {
            mesh.set_selected(f, false);
        }
        mesh.set_selected(crate::mesh::FaceId::new(1), true);

        let selected = select_cards(&mut mesh, 0, CardSelection::Selected, &[1]).unwrap();
        assert_eq!(selected, faces_per_card);

        let selected = select_cards(&mut mesh, 0, CardSelection::All, &[1]).unwrap();
        assert_eq!(selected, 2 * faces_per_card);
    }
}
