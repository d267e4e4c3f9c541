//! The host-side mesh seam.

use nalgebra::Point3;

use super::card_mesh::CardMesh;
use super::index::{MeshIndex, VertexId};
use crate::error::{Result, TressError};

/// Source of mesh geometry owned by a host application.
///
/// The algorithms only ever read a [`CardMesh`] snapshot. Vertex positions flow
/// back to the host through [`commit_positions`](MeshProvider::commit_positions)
/// as one complete buffer.
pub trait MeshProvider<I: MeshIndex = u32> {
    /// Take a snapshot of the current topology, UVs, materials and selection.
    fn snapshot(&self) -> Result<CardMesh<I>>;

    /// Replace every local-space vertex position.
    fn commit_positions(&mut self, positions: &[Point3<f64>]) -> Result<()>;
}

impl<I: MeshIndex> MeshProvider<I> for CardMesh<I> {
    fn snapshot(&self) -> Result<CardMesh<I>> {
        Ok(self.clone())
    }

    fn commit_positions(&mut self, positions: &[Point3<f64>]) -> Result<()> {
        if positions.len() != self.num_vertices() {
            return Err(TressError::invalid_param(
                "positions",
                positions.len(),
                "must provide one position per vertex",
            ));
        }
        for (i, &p) in positions.iter().enumerate() {
            self.set_position(VertexId::new(i), p);
        }
        Ok(())
    }
}
