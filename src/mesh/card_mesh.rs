//! Polygon mesh with per-corner UV layers.
//!
//! [`CardMesh`] is the read model the hair-card algorithms work on. It stores
//! vertex positions, polygonal faces as runs of corners, one or more UV layers
//! (one coordinate per face corner, so seams are represented by corners of the
//! same vertex carrying different UVs), a material index and a selection flag
//! per face, and an undirected edge table built from the face boundaries.
//!
//! Meshes are built with [`build_from_polygons`](super::build_from_polygons) or
//! [`build_from_triangles`](super::build_from_triangles).

use nalgebra::{Matrix4, Point2, Point3};

use super::index::{CornerId, EdgeId, FaceId, MeshIndex, VertexId};

/// A polygonal face: a contiguous run of corners.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// First corner of this face.
    pub first_corner: CornerId<I>,
    /// Number of corners (and boundary edges) of this face.
    pub num_corners: usize,
    /// Material slot index.
    pub material: usize,
    /// Whether the face is part of the current selection.
    pub selected: bool,
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<I: MeshIndex = u32> {
    /// The two endpoints, lower vertex index first.
    pub vertices: [VertexId<I>; 2],
}

impl<I: MeshIndex> Edge<I> {
    /// The endpoint that is not `v`, if `v` is on this edge.
    pub fn other(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        if self.vertices[0] == v {
            Some(self.vertices[1])
        } else if self.vertices[1] == v {
            Some(self.vertices[0])
        } else {
            None
        }
    }
}

/// A polygon mesh carrying per-corner UV layers, face materials and selection.
#[derive(Debug, Clone)]
pub struct CardMesh<I: MeshIndex = u32> {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) corner_vertices: Vec<VertexId<I>>,
    /// Edge leaving each corner towards the next corner of its face.
    pub(crate) corner_edges: Vec<EdgeId<I>>,
    pub(crate) faces: Vec<Face<I>>,
    pub(crate) edges: Vec<Edge<I>>,
    pub(crate) vertex_edges: Vec<Vec<EdgeId<I>>>,
    pub(crate) uv_layers: Vec<Vec<Point2<f64>>>,
    pub(crate) world: Matrix4<f64>,
}

impl<I: MeshIndex> CardMesh<I> {
    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of face corners.
    #[inline]
    pub fn num_corners(&self) -> usize {
        self.corner_vertices.len()
    }

    /// Get the number of UV layers.
    #[inline]
    pub fn num_uv_channels(&self) -> usize {
        self.uv_layers.len()
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> &Face<I> {
        &self.faces[f.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, e: EdgeId<I>) -> &Edge<I> {
        &self.edges[e.index()]
    }

    /// Get the local-space position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Get the world-space position of a vertex.
    #[inline]
    pub fn world_position(&self, v: VertexId<I>) -> Point3<f64> {
        self.world.transform_point(self.position(v))
    }

    /// Set the local-space position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
    }

    /// All local-space vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// The object-to-world transform applied by [`world_position`](Self::world_position).
    pub fn world_matrix(&self) -> &Matrix4<f64> {
        &self.world
    }

    /// Set the object-to-world transform.
    pub fn set_world_matrix(&mut self, world: Matrix4<f64>) {
        self.world = world;
    }

    /// The vertex a corner refers to.
    #[inline]
    pub fn corner_vertex(&self, c: CornerId<I>) -> VertexId<I> {
        self.corner_vertices[c.index()]
    }

    /// A UV layer (one coordinate per corner), if the channel exists.
    pub fn uv_layer(&self, channel: usize) -> Option<&[Point2<f64>]> {
        self.uv_layers.get(channel).map(|layer| layer.as_slice())
    }

    /// The UV coordinate of a corner in a channel.
    #[inline]
    pub fn corner_uv(&self, channel: usize, c: CornerId<I>) -> Point2<f64> {
        self.uv_layers[channel][c.index()]
    }

    /// Material index of a face.
    #[inline]
    pub fn material(&self, f: FaceId<I>) -> usize {
        self.faces[f.index()].material
    }

    // ==================== Selection ====================

    /// Whether a face is selected.
    #[inline]
    pub fn is_selected(&self, f: FaceId<I>) -> bool {
        self.faces[f.index()].selected
    }

    /// Select or deselect a face.
    pub fn set_selected(&mut self, f: FaceId<I>, selected: bool) {
        self.faces[f.index()].selected = selected;
    }

    /// Select every face.
    pub fn select_all(&mut self) {
        for face in &mut self.faces {
            face.selected = true;
        }
    }

    /// Deselect every face using the given material. Returns how many faces changed.
    pub fn deselect_material(&mut self, material: usize) -> usize {
        let mut count = 0;
        for face in &mut self.faces {
            if face.material == material && face.selected {
                face.selected = false;
                count += 1;
            }
        }
        count
    }

    /// Iterate over the selected face IDs.
    pub fn selected_face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_ids().filter(move |&f| self.is_selected(f))
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        VertexId::range(self.positions.len())
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        FaceId::range(self.faces.len())
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        EdgeId::range(self.edges.len())
    }

    /// Iterate over the corners of a face, in winding order.
    pub fn face_corners(&self, f: FaceId<I>) -> impl Iterator<Item = CornerId<I>> {
        let face = self.faces[f.index()];
        let start = face.first_corner.index();
        (start..start + face.num_corners).map(CornerId::new)
    }

    /// Iterate over the vertices of a face, in winding order.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_corners(f).map(move |c| self.corner_vertex(c))
    }

    /// Iterate over the boundary edges of a face.
    pub fn face_edges(&self, f: FaceId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.face_corners(f).map(move |c| self.corner_edges[c.index()])
    }

    /// Edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId<I>) -> &[EdgeId<I>] {
        &self.vertex_edges[v.index()]
    }

    /// Vertices sharing an edge with `v`.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_edges(v)
            .iter()
            .filter_map(move |&e| self.edge(e).other(v))
    }

    // ==================== Geometry ====================

    /// Compute the length of an edge in local space.
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        let [v0, v1] = self.edge(e).vertices;
        (self.position(v1) - self.position(v0)).norm()
    }

    /// Compute the average edge length in local space.
    pub fn average_edge_length(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }
        let total: f64 = self.edge_ids().map(|e| self.edge_length(e)).sum();
        total / self.edges.len() as f64
    }

    /// Compute the bounding box of the mesh in local space.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.positions.first()?;

        let mut min = *first;
        let mut max = *first;

        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    /// Whether every face is a triangle.
    pub fn is_triangle_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.num_corners == 3)
    }
}
