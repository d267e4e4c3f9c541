//! Bone naming conventions of generated hair rigs.
//!
//! Generated chains are named `{prefix}_{loop_index}_{segment}` and hang from a
//! rig root bone. Scalp hair uses the `RL_Hair` prefix under
//! [`HEAD_RIG_NAME`]; beard hair uses `RL_Beard` under [`JAW_RIG_NAME`].

use crate::config::RigParent;

/// Rig root of scalp hair chains.
pub const HEAD_RIG_NAME: &str = "RL_Hair_Rig_Head";
/// Rig root of beard chains.
pub const JAW_RIG_NAME: &str = "RL_Hair_Rig_Jaw";
/// Prefix of scalp hair bones.
pub const HAIR_BONE_PREFIX: &str = "RL_Hair";
/// Prefix of beard bones.
pub const BEARD_BONE_PREFIX: &str = "RL_Beard";
/// Candidate names of the head bone, in lookup order.
pub const HEAD_BONE_NAMES: &[&str] = &["CC_Base_Head", "RL_Head", "Head", "head"];
/// Candidate names of the jaw bone, in lookup order.
pub const JAW_BONE_NAMES: &[&str] = &["CC_Base_JawRoot", "RL_JawRoot", "JawRoot"];
/// Eye bones used to estimate the rig root height.
pub const EYE_BONE_NAMES: &[&str] = &["CC_Base_R_Eye", "CC_Base_L_Eye"];

/// Layer of rig root bones.
pub const RIG_ROOT_LAYER: u32 = 24;
/// Layer of generated hair bones.
pub const HAIR_BONE_LAYER: u32 = 25;

impl RigParent {
    /// Both parents, in the order rigs are visited.
    pub const ALL: [RigParent; 2] = [RigParent::Head, RigParent::Jaw];

    /// Name of the rig root bone for this parent.
    pub fn rig_name(self) -> &'static str {
        match self {
            RigParent::Head => HEAD_RIG_NAME,
            RigParent::Jaw => JAW_RIG_NAME,
        }
    }

    /// Prefix of chain bones hanging from this parent.
    pub fn bone_prefix(self) -> &'static str {
        match self {
            RigParent::Head => HAIR_BONE_PREFIX,
            RigParent::Jaw => BEARD_BONE_PREFIX,
        }
    }

    /// Candidate names of the anatomical bone the rig root is parented to.
    pub fn anchor_bone_names(self) -> &'static [&'static str] {
        match self {
            RigParent::Head => HEAD_BONE_NAMES,
            RigParent::Jaw => JAW_BONE_NAMES,
        }
    }

    /// The parent whose bone prefix `name` starts with.
    pub fn for_bone(name: &str) -> Option<RigParent> {
        if name.starts_with(BEARD_BONE_PREFIX) {
            Some(RigParent::Jaw)
        } else if name.starts_with(HAIR_BONE_PREFIX) {
            Some(RigParent::Head)
        } else {
            None
        }
    }
}

/// Whether a bone or vertex group belongs to a generated hair rig.
///
/// Rig root bones count as hair bones too.
pub fn is_hair_bone(name: &str) -> bool {
    name.starts_with(HAIR_BONE_PREFIX) || name.starts_with(BEARD_BONE_PREFIX)
}

/// Whether a bone is one of the rig roots.
pub fn is_hair_rig_bone(name: &str) -> bool {
    name.starts_with(HEAD_RIG_NAME) || name.starts_with(JAW_RIG_NAME)
}

/// Name of segment `segment` of chain `loop_index`.
pub fn chain_bone_name(prefix: &str, loop_index: usize, segment: usize) -> String {
    format!("{}_{}_{}", prefix, loop_index, segment)
}

/// Common name prefix of every bone in chain `loop_index`.
pub fn chain_prefix(prefix: &str, loop_index: usize) -> String {
    format!("{}_{}_", prefix, loop_index)
}
