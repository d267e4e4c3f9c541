//! Configuration for hair-card extraction, bone generation and weight binding.
//!
//! Every entry point takes a [`HairRigConfig`] explicitly. Rig-target specific
//! behavior is looked up once through [`RigTarget::policy`] rather than being
//! branched on throughout the algorithms.
//!
//! # Example
//!
//! ```
//! use tress::config::{HairRigConfig, RigTarget};
//! use nalgebra::Vector2;
//!
//! let config = HairRigConfig::default()
//!     .with_card_dir(Vector2::new(0.0, -1.0))
//!     .with_bone_length(0.05)
//!     .with_rig_target(RigTarget::Spring)
//!     .with_seed(7);
//!
//! assert_eq!(config.effective_existing_scale(), 0.0);
//! assert!(config.effective_min_weight() > 0.0);
//! ```

use nalgebra::Vector2;

use crate::error::{Result, TressError};

/// The rig the generated weights are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigTarget {
    /// A general skeletal rig: root bones stay free and weights may fall to zero.
    #[default]
    Standard,
    /// A spring-bone simulation rig: root bones are pinned and locked.
    Spring,
}

/// Behavior switches derived from a [`RigTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigPolicy {
    /// Lower bound for every written weight.
    pub min_weight: f64,
    /// Write `1 - max_weight` onto each chain's root bone for the card's vertices.
    pub pin_root_weight: bool,
    /// Root segments get full weight instead of fading in along the segment.
    pub full_root_segment: bool,
    /// Lock location/rotation/scale of each chain's root pose bone after binding.
    pub lock_root_bones: bool,
    /// Overrides the configured scale applied to existing non-hair weights.
    pub existing_scale_override: Option<f64>,
    /// Strip non-hair groups from bound meshes so they import as accessories.
    pub convert_to_accessory: bool,
}

impl RigTarget {
    /// The policy table entry for this target.
    pub const fn policy(self) -> RigPolicy {
        match self {
            RigTarget::Standard => RigPolicy {
                min_weight: 0.0,
                pin_root_weight: false,
                full_root_segment: false,
                lock_root_bones: false,
                existing_scale_override: None,
                convert_to_accessory: false,
            },
            RigTarget::Spring => RigPolicy {
                min_weight: 0.01,
                pin_root_weight: true,
                full_root_segment: true,
                lock_root_bones: true,
                existing_scale_override: Some(0.0),
                convert_to_accessory: true,
            },
        }
    }
}

/// Which anatomical root a set of hair chains hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RigParent {
    /// Scalp hair, parented under the head bone.
    #[default]
    Head,
    /// Beard hair, parented under the jaw bone.
    Jaw,
}

/// Which faces of a mesh take part in card analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardSelection {
    /// Only the selected faces (expanded to their whole UV islands).
    #[default]
    Selected,
    /// Every face of the mesh.
    All,
}

/// Which existing bone chains take part in an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoneSelection {
    /// Chains with at least one selected bone.
    #[default]
    Selected,
    /// Every hair chain.
    All,
}

/// Parameters for card extraction, bone generation and weight binding.
///
/// Lengths and radii are in world units (meters).
#[derive(Debug, Clone)]
pub struct HairRigConfig {
    /// Direction along the hair cards in UV space (root to tip).
    pub card_dir: Vector2<f64>,
    /// Minimum `|cos|` between an edge's UV direction and `card_dir` for the
    /// edge to count as aligned. Lateral edges are those below it.
    pub dir_threshold: f64,
    /// Merge the length loops of each card into one averaged loop.
    pub merge_loops: bool,
    /// Target length of a generated bone.
    pub bone_length: f64,
    /// Length skipped at the root of each loop before the first bone.
    pub skip_length: f64,
    /// Distance beyond which a bone contributes no weight.
    pub max_radius: f64,
    /// Maximum number of bone chains influencing one card.
    pub max_bones: usize,
    /// Upper bound of the per-chain weight.
    pub max_weight: f64,
    /// Exponent applied to the arc-length fraction along the card.
    pub curve_exponent: f64,
    /// Fraction of `max_weight` by which each chain's weight may randomly vary.
    pub variance: f64,
    /// Multiplier applied to existing non-hair weights before binding.
    pub existing_scale: f64,
    /// Weight floor; `None` uses the rig target's policy.
    pub min_weight: Option<f64>,
    /// Seed for the weight variance generator.
    pub seed: u64,
    /// The rig the weights are generated for.
    pub rig_target: RigTarget,
    /// Anatomical root the generated chains hang from.
    pub parent: RigParent,
    /// Which faces take part in binding.
    pub card_mode: CardSelection,
    /// Which bone chains take part in binding, removal and regeneration.
    pub bone_mode: BoneSelection,
    /// Number of weight smoothing passes after binding.
    pub smoothing_iterations: usize,
    /// UV channel used for island and card analysis.
    pub uv_channel: usize,
    /// Material slots (e.g. the scalp) whose faces are never treated as cards.
    pub excluded_materials: Vec<usize>,
    /// Whether to use parallel execution for order-independent phases (default: true).
    pub parallel: bool,
}

impl Default for HairRigConfig {
    fn default() -> Self {
        Self {
            card_dir: Vector2::new(0.0, -1.0),
            dir_threshold: 0.9,
            merge_loops: true,
            bone_length: 0.075,
            skip_length: 0.075,
            max_radius: 0.075,
            max_bones: 2,
            max_weight: 1.0,
            curve_exponent: 0.5,
            variance: 0.75,
            existing_scale: 1.0,
            min_weight: None,
            seed: 1,
            rig_target: RigTarget::Standard,
            parent: RigParent::Head,
            card_mode: CardSelection::Selected,
            bone_mode: BoneSelection::Selected,
            smoothing_iterations: 5,
            uv_channel: 0,
            excluded_materials: Vec::new(),
            parallel: true,
        }
    }
}

impl HairRigConfig {
    /// Set the card direction in UV space.
    pub fn with_card_dir(mut self, card_dir: Vector2<f64>) -> Self {
        self.card_dir = card_dir;
        self
    }

    /// Set the alignment threshold (clamped to [0, 1]).
    pub fn with_dir_threshold(mut self, threshold: f64) -> Self {
        self.dir_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set whether card loops are merged.
    pub fn with_merge_loops(mut self, merge: bool) -> Self {
        self.merge_loops = merge;
        self
    }

    /// Set the target bone length.
    pub fn with_bone_length(mut self, length: f64) -> Self {
        self.bone_length = length;
        self
    }

    /// Set the root skip length.
    pub fn with_skip_length(mut self, length: f64) -> Self {
        self.skip_length = length.max(0.0);
        self
    }

    /// Set the bone influence radius.
    pub fn with_max_radius(mut self, radius: f64) -> Self {
        self.max_radius = radius;
        self
    }

    /// Set the maximum number of chains per card.
    pub fn with_max_bones(mut self, max_bones: usize) -> Self {
        self.max_bones = max_bones.max(1);
        self
    }

    /// Set the maximum chain weight (clamped to [0, 1]).
    pub fn with_max_weight(mut self, weight: f64) -> Self {
        self.max_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set the length curve exponent.
    pub fn with_curve_exponent(mut self, exponent: f64) -> Self {
        self.curve_exponent = exponent.max(0.0);
        self
    }

    /// Set the weight variance (clamped to [0, 1]).
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance.clamp(0.0, 1.0);
        self
    }

    /// Set the existing-weight scale.
    pub fn with_existing_scale(mut self, scale: f64) -> Self {
        self.existing_scale = scale.max(0.0);
        self
    }

    /// Override the weight floor.
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.min_weight = Some(min_weight.clamp(0.0, 1.0));
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the rig target.
    pub fn with_rig_target(mut self, target: RigTarget) -> Self {
        self.rig_target = target;
        self
    }

    /// Set the anatomical parent of new chains.
    pub fn with_parent(mut self, parent: RigParent) -> Self {
        self.parent = parent;
        self
    }

    /// Set the card selection mode.
    pub fn with_card_mode(mut self, mode: CardSelection) -> Self {
        self.card_mode = mode;
        self
    }

    /// Set the bone selection mode.
    pub fn with_bone_mode(mut self, mode: BoneSelection) -> Self {
        self.bone_mode = mode;
        self
    }

    /// Set the number of smoothing passes.
    pub fn with_smoothing(mut self, iterations: usize) -> Self {
        self.smoothing_iterations = iterations;
        self
    }

    /// Set the UV channel.
    pub fn with_uv_channel(mut self, channel: usize) -> Self {
        self.uv_channel = channel;
        self
    }

    /// Exclude faces with this material from card analysis.
    pub fn exclude_material(mut self, material: usize) -> Self {
        if !self.excluded_materials.contains(&material) {
            self.excluded_materials.push(material);
        }
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

    /// The policy table entry of the configured rig target.
    pub fn policy(&self) -> RigPolicy {
        self.rig_target.policy()
    }

    /// The weight floor after applying the rig target's default.
    pub fn effective_min_weight(&self) -> f64 {
        self.min_weight.unwrap_or(self.policy().min_weight)
    }

    /// The existing-weight scale after applying the rig target's override.
    pub fn effective_existing_scale(&self) -> f64 {
        self.policy()
            .existing_scale_override
            .unwrap_or(self.existing_scale)
    }

    /// The card direction normalized to unit length.
    pub fn unit_card_dir(&self) -> Result<Vector2<f64>> {
        self.card_dir.try_normalize(f64::EPSILON).ok_or_else(|| {
            TressError::invalid_param("card_dir", format!("{:?}", self.card_dir), "must be non-zero")
        })
    }

    /// Check that the numeric parameters can drive the algorithms.
    pub fn validate(&self) -> Result<()> {
        self.unit_card_dir()?;
        if !(self.bone_length > 0.0) {
            return Err(TressError::invalid_param(
                "bone_length",
                self.bone_length,
                "must be positive",
            ));
        }
        if !(self.max_radius > 0.0) {
            return Err(TressError::invalid_param(
                "max_radius",
                self.max_radius,
                "must be positive",
            ));
        }
        if self.max_bones == 0 {
            return Err(TressError::invalid_param(
                "max_bones",
                self.max_bones,
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.dir_threshold) {
            return Err(TressError::invalid_param(
                "dir_threshold",
                self.dir_threshold,
                "must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.max_weight) {
            return Err(TressError::invalid_param(
                "max_weight",
                self.max_weight,
                "must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.variance) {
            return Err(TressError::invalid_param(
                "variance",
                self.variance,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let standard = RigTarget::Standard.policy();
        assert_eq!(standard.min_weight, 0.0);
        assert!(!standard.pin_root_weight);
        assert_eq!(standard.existing_scale_override, None);

        let spring = RigTarget::Spring.policy();
        assert_eq!(spring.min_weight, 0.01);
        assert!(spring.pin_root_weight);
        assert!(spring.lock_root_bones);
        assert_eq!(spring.existing_scale_override, Some(0.0));
    }

    #[test]
    fn test_min_weight_override() {
        let config = HairRigConfig::default().with_min_weight(0.2);
        assert_eq!(config.effective_min_weight(), 0.2);
        let config = HairRigConfig::default().with_rig_target(RigTarget::Spring);
        assert_eq!(config.effective_min_weight(), 0.01);
    }

    #[test]
    fn test_existing_scale() {
        let config = HairRigConfig::default().with_existing_scale(0.5);
        assert_eq!(config.effective_existing_scale(), 0.5);
        let config = config.with_rig_target(RigTarget::Spring);
        assert_eq!(config.effective_existing_scale(), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(HairRigConfig::default().validate().is_ok());
        assert!(HairRigConfig::default()
            .with_card_dir(Vector2::zeros())
            .validate()
            .is_err());
        assert!(HairRigConfig::default().with_bone_length(0.0).validate().is_err());
        assert!(HairRigConfig::default().with_max_radius(-1.0).validate().is_err());

        let mut config = HairRigConfig::default();
        config.variance = -0.5;
        assert!(matches!(
            config.validate(),
            Err(TressError::InvalidParameter { name: "variance", .. })
        ));

        let mut config = HairRigConfig::default();
        config.max_weight = 1.5;
        assert!(config.validate().is_err());
        config.max_weight = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unit_card_dir() {
        let config = HairRigConfig::default().with_card_dir(Vector2::new(3.0, 4.0));
        let dir = config.unit_card_dir().unwrap();
        assert!((dir.norm() - 1.0).abs() < 1e-12);
        assert!((dir.x - 0.6).abs() < 1e-12);
    }
}
