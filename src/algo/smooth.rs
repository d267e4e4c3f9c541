//! Smoothing of per-vertex scalar fields.
//!
//! Weight maps are smoothed the way positions are smoothed in a mesh fairing
//! pass: every vertex moves towards the mean of its edge neighbors.
//!
//! # Example
//!
//! ```
//! use tress::mesh::{build_from_polygons, CardMesh};
//! use tress::algo::smooth::{laplacian_smooth_values, SmoothOptions};
//! use nalgebra::{Point2, Point3};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let uvs = vertices.iter().map(|p| Point2::new(p.x, p.y)).collect();
//! let mesh: CardMesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]], vec![uvs], None).unwrap();
//!
//! let mut values = vec![1.0, 0.0, 0.0, 0.0];
//! laplacian_smooth_values(&mesh, &mut values, None, &SmoothOptions::default());
//! assert_eq!(values, vec![0.0, 0.5, 0.0, 0.5]);
//! ```

use rayon::prelude::*;

use crate::mesh::{CardMesh, MeshIndex, VertexId};

use super::Progress;

/// Options for scalar field smoothing.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of smoothing iterations.
    pub iterations: usize,

    /// Blend factor towards the neighbor mean (0.0 to 1.0).
    pub factor: f64,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            factor: 1.0,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Create options with the specified number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Create options with the specified blend factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Laplacian smoothing of one value per vertex.
///
/// For each iteration every movable vertex takes
/// `value + factor * (mean(neighbors) - value)`, computed from the previous
/// iteration's values. Vertices without neighbors keep their value. With
/// `movable` set, only vertices flagged `true` change; all vertices still act
/// as neighbors.
///
/// # Panics
///
/// Panics if `values` (or `movable`) is shorter than the vertex count.
pub fn laplacian_smooth_values<I: MeshIndex + Sync>(
    mesh: &CardMesh<I>,
    values: &mut [f64],
    movable: Option<&[bool]>,
    options: &SmoothOptions,
) {
    laplacian_smooth_values_with_progress(mesh, values, movable, options, &Progress::none());
}

/// Scalar Laplacian smoothing with progress reporting.
pub fn laplacian_smooth_values_with_progress<I: MeshIndex + Sync>(
    mesh: &CardMesh<I>,
    values: &mut [f64],
    movable: Option<&[bool]>,
    options: &SmoothOptions,
    progress: &Progress,
) {
    if options.iterations == 0 || options.factor == 0.0 {
        return;
    }

    let num_vertices = mesh.num_vertices();

    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Smoothing weights");

        let current: &[f64] = values;
        let step = |i: usize| {
            if movable.is_some_and(|m| !m[i]) {
                current[i]
            } else {
                compute_laplacian_step(mesh, current, VertexId::new(i), options.factor)
            }
        };

        let new_values: Vec<f64> = if options.parallel {
            (0..num_vertices).into_par_iter().map(step).collect()
        } else {
            (0..num_vertices).map(step).collect()
        };

        values[..num_vertices].copy_from_slice(&new_values);
    }
    progress.report(options.iterations, options.iterations, "Smoothing weights");
}

/// Move one value towards the mean of its neighbors.
fn compute_laplacian_step<I: MeshIndex>(
    mesh: &CardMesh<I>,
    values: &[f64],
    v: VertexId<I>,
    factor: f64,
) -> f64 {
    let value = values[v.index()];
    let mut sum = 0.0;
    let mut count = 0usize;

    for neighbor in mesh.vertex_neighbors(v) {
        sum += values[neighbor.index()];
        count += 1;
    }

    if count == 0 {
        return value;
    }

    let mean = sum / count as f64;
    value + factor * (mean - value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{strip_mesh, StripLayout};
    use approx::assert_relative_eq;

    fn spike() -> (CardMesh, Vec<f64>) {
        let mesh = strip_mesh(&[StripLayout::default()]);
        let mut values = vec![0.0; mesh.num_vertices()];
        values[7] = 1.0;
        (mesh, values)
    }

    #[test]
    fn test_smoothing_spreads_spike() {
        let (mesh, mut values) = spike();
        let options = SmoothOptions::default().with_factor(0.5);
        laplacian_smooth_values(&mesh, &mut values, None, &options);

        assert_relative_eq!(values[7], 0.5);
        for n in mesh.vertex_neighbors(VertexId::new(7)) {
            assert!(values[n.index()] > 0.0);
        }
        assert_eq!(values[0], 0.0);
    }

    #[test]
    fn test_constant_field_unchanged() {
        let mesh = strip_mesh(&[StripLayout::default()]);
        let mut values = vec![0.25; mesh.num_vertices()];
        laplacian_smooth_values(&mesh, &mut values, None, &SmoothOptions::default().with_iterations(5));
        for v in values {
            assert_relative_eq!(v, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_movable_mask() {
        let (mesh, mut values) = spike();
        let mut movable = vec![true; mesh.num_vertices()];
        movable[7] = false;
        laplacian_smooth_values(&mesh, &mut values, Some(movable.as_slice()), &SmoothOptions::default());
        assert_eq!(values[7], 1.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (mesh, mut a) = spike();
        let mut b = a.clone();
        let options = SmoothOptions::default().with_iterations(4).with_factor(0.7);
        laplacian_smooth_values(&mesh, &mut a, None, &options);
        laplacian_smooth_values(&mesh, &mut b, None, &options.clone().sequential());
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_iterations_no_change() {
        let (mesh, mut values) = spike();
        let original = values.clone();
        laplacian_smooth_values(&mesh, &mut values, None, &SmoothOptions::default().with_iterations(0));
        assert_eq!(values, original);
    }
}
