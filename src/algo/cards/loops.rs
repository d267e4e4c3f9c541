//! Ordering vertex loops along the card and assembling cards.

use std::cmp::Ordering;

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::algo::uv_map::UvMap;
use crate::mesh::{CardMesh, MeshIndex, VertexId};

/// The UV axis and sense that a direction orders points by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvOrder {
    /// Ascending u (`dir.x > 0`).
    UAscending,
    /// Descending u (`dir.x < 0`).
    UDescending,
    /// Ascending v (`dir.x == 0`, `dir.y > 0`).
    VAscending,
    /// Descending v (anything else).
    VDescending,
}

impl UvOrder {
    /// Pick the dominant ordering for a card direction.
    pub fn from_dir(dir: &Vector2<f64>) -> Self {
        if dir.x > 0.0 {
            UvOrder::UAscending
        } else if dir.x < 0.0 {
            UvOrder::UDescending
        } else if dir.y > 0.0 {
            UvOrder::VAscending
        } else {
            UvOrder::VDescending
        }
    }

    /// Compare two UV coordinates under this ordering.
    pub fn compare(self, a: &Point2<f64>, b: &Point2<f64>) -> Ordering {
        match self {
            UvOrder::UAscending => a.x.total_cmp(&b.x),
            UvOrder::UDescending => b.x.total_cmp(&a.x),
            UvOrder::VAscending => a.y.total_cmp(&b.y),
            UvOrder::VDescending => b.y.total_cmp(&a.y),
        }
    }
}

/// Sort vertices along the card direction by their UV coordinates.
///
/// Vertices missing from `uv_map` are dropped. The sort is stable.
pub fn sort_verts_by_uv<I: MeshIndex>(
    vertices: &[VertexId<I>],
    uv_map: &UvMap<I>,
    dir: &Vector2<f64>,
) -> Vec<VertexId<I>> {
    let order = UvOrder::from_dir(dir);
    let mut keyed: Vec<(VertexId<I>, Point2<f64>)> = vertices
        .iter()
        .filter_map(|&v| uv_map.get(v).map(|uv| (v, uv)))
        .collect();
    keyed.sort_by(|a, b| order.compare(&a.1, &b.1));
    keyed.into_iter().map(|(v, _)| v).collect()
}

/// World-space positions of a vertex loop.
pub fn loop_world_positions<I: MeshIndex>(
    mesh: &CardMesh<I>,
    vertices: &[VertexId<I>],
) -> Vec<Point3<f64>> {
    vertices.iter().map(|&v| mesh.world_position(v)).collect()
}

/// Average same-length loops point by point into one polyline.
///
/// Returns `None` when there are no loops or when the loops differ in length.
/// Loops are never resampled.
pub fn merge_length_loops(loops: &[Vec<Point3<f64>>]) -> Option<Vec<Point3<f64>>> {
    let size = loops.first()?.len();
    if loops.iter().any(|l| l.len() != size) {
        return None;
    }

    let n = loops.len() as f64;
    let merged = (0..size)
        .map(|i| {
            let sum: Vector3<f64> = loops.iter().map(|l| l[i].coords).sum();
            Point3::from(sum / n)
        })
        .collect();
    Some(merged)
}

/// A hair card described across its length.
///
/// `median[i]` is the mean world position of the vertices in `loops[i]`, and
/// both run from the card root to its tip.
#[derive(Debug, Clone)]
pub struct Card<I: MeshIndex = u32> {
    /// Mean position of each lateral loop, root to tip.
    pub median: Vec<Point3<f64>>,
    /// The vertices of each lateral loop, in the same order as `median`.
    pub loops: Vec<Vec<VertexId<I>>>,
}

impl<I: MeshIndex> Card<I> {
    /// Number of lateral positions along the card.
    pub fn len(&self) -> usize {
        self.median.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }
}

/// Build a card from unordered lateral loops.
///
/// Each loop is reduced to its mean world position and mean UV, and the loops
/// are ordered by that mean UV along `dir`. Empty loops are ignored.
pub fn lateral_card<I: MeshIndex>(
    mesh: &CardMesh<I>,
    loops: Vec<Vec<VertexId<I>>>,
    uv_map: &UvMap<I>,
    dir: &Vector2<f64>,
) -> Card<I> {
    let order = UvOrder::from_dir(dir);

    let mut entries: Vec<(Point3<f64>, Point2<f64>, Vec<VertexId<I>>)> = loops
        .into_iter()
        .filter(|l| !l.is_empty())
        .map(|l| {
            let n = l.len() as f64;
            let co: Vector3<f64> = l.iter().map(|&v| mesh.world_position(v).coords).sum();
            let uv: Vector2<f64> = l
                .iter()
                .map(|&v| uv_map.get(v).unwrap_or_else(Point2::origin).coords)
                .sum();
            (Point3::from(co / n), Point2::from(uv / n), l)
        })
        .collect();

    entries.sort_by(|a, b| order.compare(&a.1, &b.1));

    let (median, loops) = entries.into_iter().map(|(co, _, l)| (co, l)).unzip();
    Card { median, loops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn column(x: f64, n: usize) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(x, 0.0, -(i as f64))).collect()
    }

    #[test]
    fn test_uv_order_from_dir() {
        assert_eq!(UvOrder::from_dir(&Vector2::new(1.0, 0.0)), UvOrder::UAscending);
        assert_eq!(UvOrder::from_dir(&Vector2::new(-0.1, 0.9)), UvOrder::UDescending);
        assert_eq!(UvOrder::from_dir(&Vector2::new(0.0, 1.0)), UvOrder::VAscending);
        assert_eq!(UvOrder::from_dir(&Vector2::new(0.0, -1.0)), UvOrder::VDescending);
    }

    #[test]
    fn test_sort_verts_by_uv() {
        let mut uv_map: UvMap = UvMap::new();
        uv_map.set(VertexId::new(0), Point2::new(0.0, 0.5));
        uv_map.set(VertexId::new(1), Point2::new(0.0, 0.9));
        uv_map.set(VertexId::new(2), Point2::new(0.0, 0.1));
        let verts = [VertexId::new(0), VertexId::new(1), VertexId::new(2), VertexId::new(7)];

        let down = sort_verts_by_uv(&verts, &uv_map, &Vector2::new(0.0, -1.0));
        let down: Vec<usize> = down.iter().map(|v| v.index()).collect();
        assert_eq!(down, vec![1, 0, 2]);

        let up = sort_verts_by_uv(&verts, &uv_map, &Vector2::new(0.0, 1.0));
        let up: Vec<usize> = up.iter().map(|v| v.index()).collect();
        assert_eq!(up, vec![2, 0, 1]);
    }

    #[test]
    fn test_merge_equal_lengths() {
        let loops = vec![column(0.0, 5), column(1.0, 5), column(2.0, 5)];
        let merged = merge_length_loops(&loops).unwrap();
        assert_eq!(merged.len(), 5);
        for (i, p) in merged.iter().enumerate() {
            assert_relative_eq!(*p, Point3::new(1.0, 0.0, -(i as f64)));
        }
    }

    #[test]
    fn test_merge_differing_lengths() {
        let loops = vec![column(0.0, 5), column(1.0, 5), column(2.0, 6)];
        assert!(merge_length_loops(&loops).is_none());
        assert!(merge_length_loops(&[]).is_none());
    }

    #[test]
    fn test_card_len() {
        let card: Card = Card {
            median: column(0.0, 3),
            loops: vec![vec![VertexId::new(0)]; 3],
        };
        assert_eq!(card.len(), 3);
        assert!(!card.is_empty());
    }
}
