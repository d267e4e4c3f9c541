//! Copying vertex positions between meshes that share a UV layout.
//!
//! Two meshes cut from the same hair asset (for example a low and a high
//! detail version, or a card mesh before and after retopology in another tool)
//! keep their UV layout. Destination vertices are matched to source vertices
//! by a UV-ID made of the fractional UV coordinate and the destination
//! material slot, so cards laid out in different UDIM tiles still match.

use std::collections::HashMap;

use log::{debug, info};
use nalgebra::Point2;

use super::islands::{check_channel, UvId, UV_ID_DECIMALS};
use crate::error::Result;
use crate::mesh::{CardMesh, MeshIndex, MeshProvider, VertexId};
use crate::weights::WeightStore;

/// Options for [`copy_positions_by_uv_id`].
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Decimal places UV coordinates are rounded to before matching.
    pub accuracy: u32,

    /// UV channel used on both meshes.
    pub channel: usize,

    /// Source vertices weighted below this in the filter group are skipped.
    pub threshold: f64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            accuracy: UV_ID_DECIMALS,
            channel: 0,
            threshold: 0.004,
        }
    }
}

impl TransferOptions {
    /// Set the matching accuracy in decimal places.
    pub fn with_accuracy(mut self, accuracy: u32) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Set the UV channel.
    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    /// Set the filter weight threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// A weight group restricting which source vertices are copied.
#[derive(Debug)]
pub struct VertexFilter<'a, W: ?Sized> {
    /// The source mesh's weights.
    pub weights: &'a W,
    /// The group to test.
    pub group: &'a str,
}

/// Move destination vertices onto the source vertices sharing their UV-ID.
///
/// `material_map` maps source material slots to destination slots; source
/// faces with an unmapped material are ignored. Positions are copied in local
/// space and committed to `dst` in one buffer. Returns the number of
/// destination vertices moved.
pub fn copy_positions_by_uv_id<P, W, I>(
    src: &CardMesh<I>,
    filter: Option<VertexFilter<'_, W>>,
    dst: &mut P,
    material_map: &HashMap<usize, usize>,
    options: &TransferOptions,
) -> Result<usize>
where
    P: MeshProvider<I> + ?Sized,
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    check_channel(src, options.channel)?;
    let target = dst.snapshot()?;
    check_channel(&target, options.channel)?;

    let mut src_map: HashMap<UvId, VertexId<I>> = HashMap::new();
    let mut filtered = 0;

    for f in src.face_ids() {
        let Some(&dst_material) = material_map.get(&src.material(f)) else {
            continue;
        };
        for c in src.face_corners(f) {
            let v = src.corner_vertex(c);
            if let Some(filter) = &filter {
                let weight = filter.weights.weight(filter.group, v).unwrap_or(0.0);
                if weight < options.threshold {
                    filtered += 1;
                    continue;
                }
            }
            let id = uv_id(src.corner_uv(options.channel, c), dst_material, options.accuracy);
            src_map.insert(id, v);
        }
    }
    debug!("{} source uv ids, {} corners filtered", src_map.len(), filtered);

    let mut positions = target.positions().to_vec();
    let mut moved = vec![false; positions.len()];

    for f in target.face_ids() {
        for c in target.face_corners(f) {
            let id = uv_id(target.corner_uv(options.channel, c), target.material(f), options.accuracy);
            if let Some(&src_vert) = src_map.get(&id) {
                let v = target.corner_vertex(c);
                positions[v.index()] = *src.position(src_vert);
                moved[v.index()] = true;
            }
        }
    }

    let count = moved.iter().filter(|&&m| m).count();
    dst.commit_positions(&positions)?;
    info!("copied {} of {} vertex positions by uv id", count, positions.len());
    Ok(count)
}

/// UV-ID with the integer tile of `u` removed.
fn uv_id(uv: Point2<f64>, material: usize, accuracy: u32) -> UvId {
    UvId::new(Point2::new(uv.x.fract(), uv.y), material, accuracy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{strip_mesh, StripLayout};
    use crate::weights::WeightMap;
    use nalgebra::Point3;

    fn identity() -> HashMap<usize, usize> {
        HashMap::from([(0, 0)])
    }

    fn displaced(layout: StripLayout) -> CardMesh {
        let mut mesh = strip_mesh(&[layout.at(Point3::new(1.0, 2.0, 3.0))]);
        let offset = nalgebra::Vector3::new(0.0, 0.5, 0.0);
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            let p = *mesh.position(v) + offset;
            mesh.set_position(v, p);
        }
        mesh
    }

    #[test]
    fn test_copy_all_positions() {
        let src = strip_mesh(&[StripLayout::default()]);
        let mut dst = displaced(StripLayout::default());

        let moved = copy_positions_by_uv_id::<_, WeightMap, _>(
            &src,
            None,
            &mut dst,
            &identity(),
            &TransferOptions::default(),
        )
        .unwrap();

        assert_eq!(moved, src.num_vertices());
        assert_eq!(dst.positions(), src.positions());
    }

    #[test]
    fn test_udim_tile_is_ignored() {
        let src = strip_mesh(&[StripLayout::default()]);
        let mut dst = displaced(StripLayout::default().offset(0.0, 2.0));

        let moved = copy_positions_by_uv_id::<_, WeightMap, _>(
            &src,
            None,
            &mut dst,
            &identity(),
            &TransferOptions::default(),
        )
        .unwrap();
        assert_eq!(moved, src.num_vertices());
    }

    #[test]
    fn test_unmapped_material_is_skipped() {
        let src = strip_mesh(&[StripLayout::default().material(1)]);
        let mut dst = displaced(StripLayout::default());
        let before = dst.positions().to_vec();

        let moved = copy_positions_by_uv_id::<_, WeightMap, _>(
            &src,
            None,
            &mut dst,
            &identity(),
            &TransferOptions::default(),
        )
        .unwrap();
        assert_eq!(moved, 0);
        assert_eq!(dst.positions(), before.as_slice());
    }

    #[test]
    fn test_weight_filter() {
        let src = strip_mesh(&[StripLayout::default()]);
        let mut dst = displaced(StripLayout::default());
        let before = dst.positions().to_vec();

        let mut weights: WeightMap = WeightMap::new();
        weights.set_weight("RL_Hair_1_0", VertexId::new(0), 1.0).unwrap();
        weights.set_weight("RL_Hair_1_0", VertexId::new(1), 0.001).unwrap();

        let filter = VertexFilter {
            weights: &weights,
            group: "RL_Hair_1_0",
        };
        let moved =
            copy_positions_by_uv_id(&src, Some(filter), &mut dst, &identity(), &TransferOptions::default())
                .unwrap();

        assert_eq!(moved, 1);
        assert_eq!(dst.positions()[0], src.positions()[0]);
        assert_eq!(dst.positions()[1], before[1]);
    }
}
