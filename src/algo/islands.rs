//! UV island analysis.
//!
//! A UV island is a maximal set of faces connected through shared UV points.
//! Two face corners are the same UV point when they reference the same vertex
//! and their UV coordinates agree to [`UV_ID_DECIMALS`] decimal places (see
//! [`UvId`]). Corners of one vertex that sit on either side of a UV seam have
//! different UV-IDs, so the seam separates islands even though the faces share
//! geometry.
//!
//! Islands are grown by breadth-first frontier expansion over an explicit
//! worklist, so arbitrarily large islands never deepen the call stack.
//!
//! # Example
//!
//! ```
//! use tress::algo::islands::{island_uv_map, uv_islands};
//! use tress::mesh::{build_from_triangles, CardMesh};
//! use nalgebra::{Point2, Point3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ];
//! let uvs = vec![
//!     Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0),
//!     Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0),
//! ];
//! let mesh: CardMesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 3, 2]], uvs).unwrap();
//!
//! let islands = uv_islands(&mesh, 0, false).unwrap();
//! assert_eq!(islands.len(), 1);
//! let uv_map = island_uv_map(&mesh, 0, &islands[0]).unwrap();
//! assert_eq!(uv_map.len(), 4);
//! ```

use std::collections::HashMap;

use log::debug;
use nalgebra::Point2;

use super::uv_map::UvMap;
use crate::error::{Result, TressError};
use crate::mesh::{CardMesh, FaceId, MeshIndex};

/// Number of decimal places UV coordinates are rounded to when forming a [`UvId`].
pub const UV_ID_DECIMALS: u32 = 5;

/// A quantized UV coordinate paired with a discriminating key.
///
/// Within one mesh the key is the vertex index, making the UV-ID a connectivity
/// key. Across meshes the key is a material slot, so that corners of different
/// meshes can be matched by UV alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UvId {
    u: i64,
    v: i64,
    key: usize,
}

impl UvId {
    /// Quantize `uv` to `decimals` decimal places and pair it with `key`.
    pub fn new(uv: Point2<f64>, key: usize, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            u: (uv.x * scale).round() as i64,
            v: (uv.y * scale).round() as i64,
            key,
        }
    }

    /// The discriminating key (vertex index or material slot).
    pub fn key(&self) -> usize {
        self.key
    }
}

/// A set of UV-connected faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island<I: MeshIndex = u32> {
    faces: Vec<FaceId<I>>,
}

impl<I: MeshIndex> Island<I> {
    /// Create an island from a list of faces.
    pub fn new(faces: Vec<FaceId<I>>) -> Self {
        Self { faces }
    }

    /// The faces of this island, in discovery order.
    pub fn faces(&self) -> &[FaceId<I>] {
        &self.faces
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Whether the island contains a face.
    pub fn contains(&self, f: FaceId<I>) -> bool {
        self.faces.contains(&f)
    }
}

pub(crate) fn check_channel<I: MeshIndex>(mesh: &CardMesh<I>, channel: usize) -> Result<()> {
    if channel >= mesh.num_uv_channels() {
        return Err(TressError::InvalidUvChannel {
            channel,
            available: mesh.num_uv_channels(),
        });
    }
    Ok(())
}

/// Partition faces into UV islands.
///
/// With `use_selected`, only selected faces are considered and connectivity
/// through unselected faces is ignored. The returned islands partition the
/// considered faces exactly.
pub fn uv_islands<I: MeshIndex>(
    mesh: &CardMesh<I>,
    channel: usize,
    use_selected: bool,
) -> Result<Vec<Island<I>>> {
    check_channel(mesh, channel)?;

    let faces: Vec<FaceId<I>> = if use_selected {
        mesh.selected_face_ids().collect()
    } else {
        mesh.face_ids().collect()
    };

    // face -> its UV-IDs, UV-ID -> faces using it
    let mut face_map: HashMap<FaceId<I>, Vec<UvId>> = HashMap::with_capacity(faces.len());
    let mut uv_faces: HashMap<UvId, Vec<FaceId<I>>> = HashMap::new();

    for &f in &faces {
        let ids: Vec<UvId> = mesh
            .face_corners(f)
            .map(|c| {
                UvId::new(
                    mesh.corner_uv(channel, c),
                    mesh.corner_vertex(c).index(),
                    UV_ID_DECIMALS,
                )
            })
            .collect();
        for &id in &ids {
            let users = uv_faces.entry(id).or_default();
            if !users.contains(&f) {
                users.push(f);
            }
        }
        face_map.insert(f, ids);
    }

    let mut assigned: HashMap<FaceId<I>, bool> = faces.iter().map(|&f| (f, false)).collect();
    let mut islands = Vec::new();

    for &seed in &faces {
        if assigned[&seed] {
            continue;
        }

        let mut island = Vec::new();
        let mut frontier = vec![seed];
        assigned.insert(seed, true);

        while !frontier.is_empty() {
            island.extend_from_slice(&frontier);

            let mut next = Vec::new();
            for f in &frontier {
                for id in &face_map[f] {
                    for &cf in &uv_faces[id] {
                        if let Some(done) = assigned.get_mut(&cf) {
                            if !*done {
                                *done = true;
                                next.push(cf);
                            }
                        }
                    }
                }
            }
            frontier = next;
        }

        islands.push(Island::new(island));
    }

    debug!("{} faces form {} uv islands", faces.len(), islands.len());

    Ok(islands)
}

/// Build the vertex → UV map of one island.
///
/// Each island has a unique UV map so this must be called per island. When a
/// vertex appears in several corners of the island the last corner wins.
pub fn island_uv_map<I: MeshIndex>(
    mesh: &CardMesh<I>,
    channel: usize,
    island: &Island<I>,
) -> Result<UvMap<I>> {
    check_channel(mesh, channel)?;

    let mut uv_map = UvMap::new();
    for &f in island.faces() {
        for c in mesh.face_corners(f) {
            uv_map.set(mesh.corner_vertex(c), mesh.corner_uv(channel, c));
        }
    }
    Ok(uv_map)
}

/// Extend the selection to every island that has at least one selected face.
///
/// Returns the number of faces newly selected.
pub fn select_linked_islands<I: MeshIndex>(mesh: &mut CardMesh<I>, channel: usize) -> Result<usize> {
    let islands = uv_islands(mesh, channel, false)?;
    let mut added = 0;
    for island in &islands {
        if island.faces().iter().any(|&f| mesh.is_selected(f)) {
            for &f in island.faces() {
                if !mesh.is_selected(f) {
                    mesh.set_selected(f, true);
                    added += 1;
                }
            }
        }
    }
    Ok(added)
}
