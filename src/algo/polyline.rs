//! Polyline measurement and evaluation.
//!
//! Hair loops, card medians and stroke paths are all ordered point sequences
//! running from root to tip. This module measures them, evaluates points at a
//! fraction of their arc length and tests proximity against them.
//!
//! # Example
//!
//! ```
//! use tress::algo::polyline::{eval_loop_at, loop_length};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, -0.5),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let length = loop_length(&points);
//! assert!((length - 1.0).abs() < 1e-12);
//!
//! let quarter = eval_loop_at(&points, length, 0.25).unwrap();
//! assert!((quarter.z + 0.25).abs() < 1e-12);
//! ```

use nalgebra::{Point3, Vector3};

/// Default distance below which a point counts as lying on a loop.
pub const ON_LOOP_THRESHOLD: f64 = 0.001;

/// Number of passes made by [`smooth_loop`].
pub const LOOP_SMOOTH_ITERATIONS: usize = 10;

/// Blend factor of each [`smooth_loop`] pass.
pub const LOOP_SMOOTH_STRENGTH: f64 = 0.5;

/// Total length of a polyline: the sum of its segment lengths.
pub fn loop_length(points: &[Point3<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Length of a polyline from its first point up to and including point `index`.
///
/// `index` is clamped to the last point.
pub fn loop_length_to(points: &[Point3<f64>], index: usize) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let end = index.min(points.len() - 1);
    loop_length(&points[..=end])
}

/// Evaluate the point at arc-length fraction `fac` of a polyline.
///
/// `length` is the total length as returned by [`loop_length`]. A fraction of
/// 0 yields the first point and a fraction of 1 the last. Fractions beyond the
/// end clamp to the last point. Returns `None` for an empty polyline.
pub fn eval_loop_at(points: &[Point3<f64>], length: f64, fac: f64) -> Option<Point3<f64>> {
    let first = *points.first()?;
    if length <= 0.0 {
        return Some(first);
    }

    let mut p0 = first;
    let mut f0 = 0.0;
    for &p1 in &points[1..] {
        let v = p1 - p0;
        let fl = v.norm() / length;
        let f1 = f0 + fl;
        if fl > 0.0 && fac >= f0 && fac <= f1 {
            return Some(p0 + v * ((fac - f0) / fl));
        }
        f0 = f1;
        p0 = p1;
    }
    Some(p0)
}

/// Distance from `co` to the segment `start`–`end`, and where along it the closest point lies.
///
/// Returns `(distance, fraction)`. Points behind `start` measure to `start`
/// with fraction 0, points beyond `end` measure to `end` with fraction 1, and
/// points alongside measure perpendicular to the segment.
///
/// # Example
///
/// ```
/// use tress::algo::polyline::distance_from_line;
/// use nalgebra::Point3;
///
/// let (d, f) = distance_from_line(
///     &Point3::new(0.5, 1.0, 0.0),
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(1.0, 0.0, 0.0),
/// );
/// assert!((d - 1.0).abs() < 1e-12);
/// assert!((f - 0.5).abs() < 1e-12);
/// ```
pub fn distance_from_line(co: &Point3<f64>, start: &Point3<f64>, end: &Point3<f64>) -> (f64, f64) {
    let line: Vector3<f64> = end - start;
    let from_start = co - start;
    let from_end = co - end;

    if line.dot(&from_start) <= 0.0 {
        (from_start.norm(), 0.0)
    } else if line.dot(&from_end) >= 0.0 {
        (from_end.norm(), 1.0)
    } else {
        let length = line.norm();
        let dir = line / length;
        let distance = (line.cross(&from_start) / length).norm();
        let fac = (dir.dot(&from_start) / length).clamp(0.0, 1.0);
        (distance, fac)
    }
}

/// Whether `co` lies within `threshold` of any segment of the polyline.
pub fn is_on_loop(co: &Point3<f64>, points: &[Point3<f64>], threshold: f64) -> bool {
    points
        .windows(2)
        .any(|w| distance_from_line(co, &w[0], &w[1]).0 < threshold)
}

/// Insert the midpoint of every segment.
pub fn subdivide_loop(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    let mut subdivided = Vec::with_capacity(points.len() * 2);
    for w in points.windows(2) {
        subdivided.push(w[0]);
        subdivided.push(nalgebra::center(&w[0], &w[1]));
    }
    subdivided.push(last);
    subdivided
}

/// Relax the interior points of a polyline towards their neighbors' average.
///
/// Each pass moves every interior point by `strength` towards the mean of
/// itself and its two neighbors, computed from the previous pass. Endpoints
/// stay fixed.
pub fn smooth_loop(points: &mut [Point3<f64>], iterations: usize, strength: f64) {
    if points.len() < 3 {
        return;
    }
    let mut previous = points.to_vec();
    for _ in 0..iterations {
        previous.copy_from_slice(points);
        for i in 1..points.len() - 1 {
            let original = previous[i];
            let average = Point3::from(
                (previous[i - 1].coords + original.coords + previous[i + 1].coords) / 3.0,
            );
            points[i] = original + (average - original) * strength;
        }
    }
}
