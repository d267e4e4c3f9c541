//! Hand-drawn strokes to hair loops.
//!
//! Guide strokes drawn over a head are often broken into several pieces. A
//! stroke whose last point lies within [`STROKE_JOIN_THRESHOLD`] of another
//! stroke's first point continues into it. [`strokes_to_loops`] joins such
//! runs into single loops, densifies them and smooths out the hand jitter.

use std::collections::HashSet;

use log::debug;
use nalgebra::Point3;

use super::polyline::{loop_length, smooth_loop, subdivide_loop, LOOP_SMOOTH_ITERATIONS, LOOP_SMOOTH_STRENGTH};

/// Maximum gap between one stroke's end and the next stroke's start (1 cm).
pub const STROKE_JOIN_THRESHOLD: f64 = 0.01;

/// Loops are subdivided until they have at least this many points.
pub const MIN_LOOP_POINTS: usize = 25;

/// Continuation links between strokes.
#[derive(Debug, Clone, Default)]
pub struct StrokeLinks {
    /// For each stroke, the strokes starting where it ends.
    pub next: Vec<Vec<usize>>,
    /// For each stroke, the strokes ending where it starts.
    pub prev: Vec<Vec<usize>>,
}

/// Link strokes end-to-start and find the stroke each run starts from.
///
/// A root is a stroke with no predecessor, reached by following first
/// predecessors. Strokes caught in a cycle of predecessors have no root.
/// Roots are returned in ascending stroke order.
pub fn combine_strokes(strokes: &[Vec<Point3<f64>>], threshold: f64) -> (StrokeLinks, Vec<usize>) {
    let n = strokes.len();
    let mut links = StrokeLinks {
        next: vec![Vec::new(); n],
        prev: vec![Vec::new(); n],
    };

    for (i, stroke) in strokes.iter().enumerate() {
        let (Some(first), Some(last)) = (stroke.first(), stroke.last()) else {
            continue;
        };
        for (j, other) in strokes.iter().enumerate() {
            if i == j {
                continue;
            }
            let (Some(other_first), Some(other_last)) = (other.first(), other.last()) else {
                continue;
            };
            if (other_first - last).norm() < threshold {
                links.next[i].push(j);
            }
            if (other_last - first).norm() < threshold {
                links.prev[i].push(j);
            }
        }
    }

    let mut roots = Vec::new();
    for i in 0..n {
        if strokes[i].is_empty() {
            continue;
        }
        if let Some(root) = find_root(&links, i) {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
    }
    roots.sort_unstable();

    (links, roots)
}

fn find_root(links: &StrokeLinks, start: usize) -> Option<usize> {
    let mut visited = HashSet::new();
    let mut current = start;
    loop {
        if !visited.insert(current) {
            return None;
        }
        match links.prev[current].first() {
            Some(&p) => current = p,
            None => return Some(current),
        }
    }
}

/// Concatenate the points of a run of strokes, following first successors.
pub fn stroke_run(strokes: &[Vec<Point3<f64>>], links: &StrokeLinks, root: usize) -> Vec<Point3<f64>> {
    let mut points = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(root);
    while let Some(i) = current {
        if !visited.insert(i) {
            break;
        }
        points.extend_from_slice(&strokes[i]);
        current = links.next[i].first().copied();
    }
    points
}

/// Turn strokes into smooth loops ready for bone generation.
///
/// Runs shorter than half a bone, or with fewer than two points, are dropped.
/// Kept runs are subdivided to at least [`MIN_LOOP_POINTS`] points and then
/// smoothed with fixed endpoints.
pub fn strokes_to_loops(strokes: &[Vec<Point3<f64>>], bone_length: f64) -> Vec<Vec<Point3<f64>>> {
    let (links, roots) = combine_strokes(strokes, STROKE_JOIN_THRESHOLD);
    debug!("{} strokes form {} runs", strokes.len(), roots.len());

    roots
        .into_iter()
        .filter_map(|root| {
            let mut points = stroke_run(strokes, &links, root);
            if points.len() < 2 || loop_length(&points) < bone_length / 2.0 {
                return None;
            }
            while points.len() < MIN_LOOP_POINTS {
                points = subdivide_loop(&points);
            }
            smooth_loop(&mut points, LOOP_SMOOTH_ITERATIONS, LOOP_SMOOTH_STRENGTH);
            Some(points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn segment(from: [f64; 3], to: [f64; 3], n: usize) -> Vec<Point3<f64>> {
        let a = Point3::from(from);
        let b = Point3::from(to);
        (0..n)
            .map(|i| a + (b - a) * (i as f64 / (n - 1) as f64))
            .collect()
    }

    #[test]
    fn test_combine_joins_nearby_ends() {
        let strokes = vec![
            segment([0.0, 0.0, 0.2], [0.0, 0.0, 0.1], 3),
            segment([0.0, 0.0, 0.095], [0.0, 0.0, 0.0], 3),
            segment([1.0, 0.0, 0.0], [1.0, 0.0, -0.1], 3),
        ];
        let (links, roots) = combine_strokes(&strokes, STROKE_JOIN_THRESHOLD);
        assert_eq!(links.next[0], vec![1]);
        assert_eq!(links.prev[1], vec![0]);
        assert_eq!(roots, vec![0, 2]);

        let run = stroke_run(&strokes, &links, 0);
        assert_eq!(run.len(), 6);
    }

    #[test]
    fn test_cyclic_strokes_have_no_root() {
        let strokes = vec![
            segment([0.0, 0.0, 0.0], [0.1, 0.0, 0.0], 2),
            segment([0.1, 0.0, 0.0], [0.0, 0.0, 0.0], 2),
        ];
        let (_, roots) = combine_strokes(&strokes, STROKE_JOIN_THRESHOLD);
        assert!(roots.is_empty());
    }

    #[test]
    fn test_strokes_to_loops() {
        let strokes = vec![
            segment([0.0, 0.0, 0.2], [0.0, 0.0, 0.1], 3),
            segment([0.0, 0.0, 0.1], [0.0, 0.0, 0.0], 3),
            // too short for a 0.05 bone
            segment([1.0, 0.0, 0.0], [1.0, 0.0, 0.01], 2),
            // single point
            vec![Point3::new(2.0, 0.0, 0.0)],
        ];
        let loops = strokes_to_loops(&strokes, 0.05);
        assert_eq!(loops.len(), 1);

        let l = &loops[0];
        assert!(l.len() >= MIN_LOOP_POINTS);
        assert_relative_eq!(l[0], Point3::new(0.0, 0.0, 0.2));
        assert_relative_eq!(*l.last().unwrap(), Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(loop_length(l), 0.2, epsilon = 1e-9);
    }
}
