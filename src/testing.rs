//! Fixtures shared by unit tests.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::mesh::{build_from_polygons, CardMesh};
use crate::rig::{Armature, Bone, Skeleton};

/// One rectangular hair card: a grid of quads hanging down from `origin`.
///
/// Columns run along +x, rows run down -z. The UV rectangle puts the root row
/// at the top (`v = uv_origin.y + uv_size.y`) and the tip row at the bottom,
/// so the card direction in UV space is `(0, -1)`.
#[derive(Debug, Clone)]
pub(crate) struct StripLayout {
    pub origin: Point3<f64>,
    pub columns: usize,
    pub rows: usize,
    pub width: f64,
    pub length: f64,
    pub uv_origin: Point2<f64>,
    pub uv_size: Vector2<f64>,
    pub material: usize,
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            columns: 2,
            rows: 4,
            width: 0.02,
            length: 0.2,
            uv_origin: Point2::origin(),
            uv_size: Vector2::new(0.05, 0.2),
            material: 0,
        }
    }
}

impl StripLayout {
    /// Shift the card by `dx` in world x and by `du` in UV u.
    pub fn offset(mut self, dx: f64, du: f64) -> Self {
        self.origin.x += dx;
        self.uv_origin.x += du;
        self
    }

    pub fn at(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn material(mut self, material: usize) -> Self {
        self.material = material;
        self
    }
}

/// Build one mesh holding every card of `layouts`, each its own UV island.
pub(crate) fn strip_mesh(layouts: &[StripLayout]) -> CardMesh {
    let mut vertices = Vec::new();
    let mut polygons = Vec::new();
    let mut uvs = Vec::new();
    let mut materials = Vec::new();

    for layout in layouts {
        let base = vertices.len();
        let stride = layout.columns + 1;
        let mut vertex_uvs = Vec::new();

        for j in 0..=layout.rows {
            for i in 0..=layout.columns {
                let s = i as f64 / layout.columns as f64;
                let t = j as f64 / layout.rows as f64;
                vertices.push(layout.origin + Vector3::new(s * layout.width, 0.0, -t * layout.length));
                vertex_uvs.push(Point2::new(
                    layout.uv_origin.x + s * layout.uv_size.x,
                    layout.uv_origin.y + (1.0 - t) * layout.uv_size.y,
                ));
            }
        }

        for j in 0..layout.rows {
            for i in 0..layout.columns {
                let quad = [
                    base + j * stride + i,
                    base + (j + 1) * stride + i,
                    base + (j + 1) * stride + i + 1,
                    base + j * stride + i + 1,
                ];
                for &v in &quad {
                    uvs.push(vertex_uvs[v - base]);
                }
                polygons.push(quad.to_vec());
                materials.push(layout.material);
            }
        }
    }

    build_from_polygons(&vertices, &polygons, vec![uvs], Some(materials.as_slice())).unwrap()
}

/// A character head: head bone from z 1.6 to 1.8, eyes at z 1.7 in front (-y).
///
/// The hair rig root of this armature lands at `(0, 0, 1.7)`.
pub(crate) fn head_armature() -> Armature {
    let mut arm = Armature::default();
    arm.insert_bone(Bone::new(
        "CC_Base_Head",
        Point3::new(0.0, 0.0, 1.6),
        Point3::new(0.0, 0.0, 1.8),
    ))
    .unwrap();
    arm.insert_bone(
        Bone::new("CC_Base_JawRoot", Point3::new(0.0, -0.02, 1.62), Point3::new(0.0, -0.08, 1.58))
            .with_parent("CC_Base_Head"),
    )
    .unwrap();
    for (name, x) in [("CC_Base_R_Eye", -0.03), ("CC_Base_L_Eye", 0.03)] {
        arm.insert_bone(
            Bone::new(name, Point3::new(x, -0.09, 1.7), Point3::new(x, -0.1, 1.7))
                .with_parent("CC_Base_Head"),
        )
        .unwrap();
    }
    arm
}
