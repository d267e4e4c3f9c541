//! Vertex weights binding hair cards to bone chains.
//!
//! Weights are read and written through the [`WeightStore`] trait; one group
//! per bone, named after it. [`WeightMap`] is the in-memory store used by the
//! command line tool and the tests.
//!
//! Binding walks each card's median root to tip. Along the way a vertex loop
//! is weighted to the closest bone of each of the `max_bones` nearest chains,
//! fading in with the arc-length fraction along the card:
//!
//! ```text
//! weight = variance * falloff(distance) / num_bones * min(bone_fac, card_fac)
//! ```
//!
//! The weights are then smoothed over the card surface.
//!
//! # Example
//!
//! ```
//! use tress::weights::{WeightMap, WeightStore};
//! use tress::mesh::VertexId;
//!
//! let mut weights: WeightMap = WeightMap::new();
//! weights.set_weight("RL_Hair_1_0", VertexId::new(3), 1.5).unwrap();
//! assert_eq!(weights.weight("RL_Hair_1_0", VertexId::new(3)), Some(1.0));
//! ```

mod assign;
mod bind;
mod maintenance;
mod smooth;
mod store;

pub use assign::{
    assign_bones, closest_bone_def, rank_chains, weight_card_to_bones, weighted_bone_distance,
    ClosestBone,
};
pub use bind::{bind_cards_to_bones, clear_hair_bone_weights, BindReport, BindTarget};
pub use maintenance::{
    convert_to_accessory, is_hair_rig_accessory, remove_hair_bone_weights, scale_existing_weights,
    EXISTING_SCALE_EPSILON,
};
pub use smooth::{apply_root_lock_policy, smooth_hair_weights};
pub use store::{WeightMap, WeightStore};
