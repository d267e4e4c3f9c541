//! Per-island UV coordinate storage.
//!
//! Each UV island has its own unambiguous vertex → UV mapping, even when the
//! mesh as a whole has seams (several corners of one vertex carrying different
//! UVs). [`UvMap`] stores that mapping for the vertices of one island.

use std::collections::HashMap;

use nalgebra::Point2;

use crate::mesh::{MeshIndex, VertexId};

/// UV coordinates for the vertices of one island.
#[derive(Debug, Clone)]
pub struct UvMap<I: MeshIndex = u32> {
    coords: HashMap<VertexId<I>, Point2<f64>>,
}

impl<I: MeshIndex> Default for UvMap<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> UvMap<I> {
    /// Create an empty UV map.
    pub fn new() -> Self {
        Self {
            coords: HashMap::new(),
        }
    }

    /// Get the UV coordinates for a vertex, if the vertex is in the island.
    #[inline]
    pub fn get(&self, v: VertexId<I>) -> Option<Point2<f64>> {
        self.coords.get(&v).copied()
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId<I>, uv: Point2<f64>) {
        self.coords.insert(v, uv);
    }

    /// Whether the vertex has a UV coordinate in this map.
    #[inline]
    pub fn contains(&self, v: VertexId<I>) -> bool {
        self.coords.contains_key(&v)
    }

    /// Get the number of mapped vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all mapped vertices with their UV coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.coords.iter().map(|(&v, &uv)| (v, uv))
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut iter = self.coords.values();
        let first = *iter.next()?;

        let mut min = first;
        let mut max = first;

        for uv in iter {
            min.x = min.x.min(uv.x);
            min.y = min.y.min(uv.y);
            max.x = max.x.max(uv.x);
            max.y = max.y.max(uv.y);
        }

        Some((min, max))
    }
}
