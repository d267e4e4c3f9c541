//! Group-level weight housekeeping.

use log::{debug, info};

use super::store::WeightStore;
use crate::error::Result;
use crate::mesh::MeshIndex;
use crate::rig::is_hair_bone;

/// Existing-weight scales at or below this remove the non-hair groups outright.
pub const EXISTING_SCALE_EPSILON: f64 = 0.001;

/// Remove hair weight groups ahead of rebinding.
///
/// `bones` names the groups to remove; `None` or an empty list means every
/// hair group. When `existing_scale` is at most [`EXISTING_SCALE_EPSILON`],
/// every non-hair group is removed as well. Returns the removed group names.
pub fn remove_hair_bone_weights<W, I>(
    store: &mut W,
    bones: Option<&[String]>,
    existing_scale: f64,
) -> Result<Vec<String>>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    let groups = store.group_names();

    let mut remove: Vec<String> = match bones {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => groups.iter().filter(|n| is_hair_bone(n)).cloned().collect(),
    };
    if existing_scale <= EXISTING_SCALE_EPSILON {
        remove.extend(groups.iter().filter(|n| !is_hair_bone(n)).cloned());
    }

    let mut removed = Vec::with_capacity(remove.len());
    for name in remove {
        if store.remove_group(&name)? {
            removed.push(name);
        }
    }
    debug!("removed {} weight groups", removed.len());
    Ok(removed)
}

/// Multiply every non-hair group's weights by `scale`.
pub fn scale_existing_weights<W, I>(store: &mut W, scale: f64) -> Result<()>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    if scale == 1.0 {
        return Ok(());
    }
    for name in store.group_names() {
        if !is_hair_bone(&name) {
            store.scale_group(&name, scale)?;
        }
    }
    Ok(())
}

/// Classify a set of weight stores as `(is_hair_rig, is_accessory)`.
///
/// A set is a hair rig if any store has a hair group, and an accessory if no
/// store has a non-hair group.
pub fn is_hair_rig_accessory<'a, W, I>(stores: impl IntoIterator<Item = &'a W>) -> (bool, bool)
where
    W: WeightStore<I> + ?Sized + 'a,
    I: MeshIndex,
{
    let mut is_hair_rig = false;
    let mut is_accessory = true;
    for store in stores {
        for name in store.group_names() {
            if is_hair_bone(&name) {
                is_hair_rig = true;
            } else {
                is_accessory = false;
            }
        }
    }
    (is_hair_rig, is_accessory)
}

/// Strip the non-hair groups from every store that carries both kinds.
///
/// Stores weighted only to hair bones are recognized as accessories by
/// character pipelines rather than as cloth or hair. Returns the number of
/// groups removed.
pub fn convert_to_accessory<W, I>(stores: &mut [&mut W]) -> Result<usize>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
{
    let mut count = 0;
    for store in stores.iter_mut() {
        let (is_hair_rig, is_accessory) = is_hair_rig_accessory(std::iter::once(&**store));
        if !is_hair_rig || is_accessory {
            continue;
        }
        for name in store.group_names() {
            if !is_hair_bone(&name) && store.remove_group(&name)? {
                count += 1;
            }
        }
    }
    if count > 0 {
        info!("removed {} non-hair groups for accessory export", count);
    }
    Ok(count)
}
