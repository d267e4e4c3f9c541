//! Distance-based weights from bone chains onto hair cards.
//!
//! Each card is bound to the few chains that run closest along its whole
//! length. Chains are ranked by a distance that grows towards the card tip, so
//! a chain hugging the root of a card but diverging at its tip loses to one
//! that follows the card. Per vertex loop of the card the weight falls off
//! linearly with the distance to the closest bone of each chain and fades in
//! from the root along the card.

use std::cmp::Ordering;

use log::debug;
use nalgebra::Point3;
use rand::Rng;
use rayon::prelude::*;

use super::store::WeightStore;
use crate::algo::cards::Card;
use crate::algo::polyline::{loop_length, loop_length_to};
use crate::config::HairRigConfig;
use crate::error::Result;
use crate::mesh::MeshIndex;
use crate::rig::BoneChain;

/// Closest bone of a chain to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestBone {
    /// Index of the bone within its chain.
    pub index: usize,
    /// Distance to the bone.
    pub distance: f64,
    /// Fraction along the bone of the closest point.
    pub fac: f64,
}

/// Find the bone of `chain` closest to `co`.
///
/// Only bones closer than `2 * max_radius` are considered; when none is, the
/// result is the chain's first bone at distance `2 * max_radius` with `fac`
/// zero.
pub fn closest_bone_def(chain: &BoneChain, co: &Point3<f64>, max_radius: f64) -> ClosestBone {
    let mut closest = ClosestBone {
        index: 0,
        distance: max_radius * 2.0,
        fac: 0.0,
    };
    for (index, bone) in chain.iter().enumerate() {
        let (distance, fac) = bone.distance_to(co);
        if distance < closest.distance {
            closest = ClosestBone { index, distance, fac };
        }
    }
    closest
}

/// Distance between a chain and a card median, weighted towards the tip.
///
/// Walking the median, each point's closest-bone distance is weighted by twice
/// its arc-length fraction; the result is averaged over the points.
pub fn weighted_bone_distance(chain: &BoneChain, median: &[Point3<f64>], max_radius: f64) -> f64 {
    let Some(first) = median.first() else {
        return 0.0;
    };
    let length = loop_length(median);
    if length <= 0.0 {
        return 0.0;
    }

    let mut walked = 0.0;
    let mut last = first;
    let mut sum = 0.0;
    for co in median {
        walked += (co - last).norm();
        last = co;
        let f = walked / length;
        sum += closest_bone_def(chain, co, max_radius).distance * f * 2.0;
    }
    sum / median.len() as f64
}

/// Indices of `chains` sorted by ascending [`weighted_bone_distance`] to `median`.
///
/// Ties keep chain order.
pub fn rank_chains(chains: &[BoneChain], median: &[Point3<f64>], max_radius: f64, parallel: bool) -> Vec<usize> {
    let distances: Vec<f64> = if parallel {
        chains
            .par_iter()
            .map(|c| weighted_bone_distance(c, median, max_radius))
            .collect()
    } else {
        chains
            .iter()
            .map(|c| weighted_bone_distance(c, median, max_radius))
            .collect()
    };

    let mut order: Vec<usize> = (0..chains.len()).collect();
    order.sort_by(|&a, &b| distances[a].partial_cmp(&distances[b]).unwrap_or(Ordering::Equal));
    order
}

/// Write one card's weights for the given chains, closest first.
///
/// One variance factor per chain is drawn from `rng` before any weight is
/// written. Every chain contributes to every vertex loop of the card.
pub fn weight_card_to_bones<W, I, R>(
    store: &mut W,
    card: &Card<I>,
    chains: &[&BoneChain],
    config: &HairRigConfig,
    rng: &mut R,
) -> Result<()>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
    R: Rng,
{
    config.validate()?;
    let num_bones = chains.len();
    if num_bones == 0 || card.median.is_empty() {
        return Ok(());
    }

    let policy = config.policy();
    let min_weight = config.effective_min_weight();
    let max_weight = config.max_weight;
    let max_radius = config.max_radius;
    let median_length = loop_length(&card.median);

    let variances: Vec<f64> = (0..num_bones)
        .map(|_| rng.gen_range(max_weight * (1.0 - config.variance)..=max_weight))
        .collect();

    if policy.pin_root_weight {
        for chain in chains {
            if let Some(root) = chain.first() {
                store.ensure_group(&root.name)?;
            }
        }
    }

    for (i, co) in card.median.iter().enumerate() {
        let Some(vert_loop) = card.loops.get(i) else {
            break;
        };
        let card_fac = (loop_length_to(&card.median, i) / median_length).powf(config.curve_exponent);

        for (b, chain) in chains.iter().enumerate() {
            if chain.is_empty() {
                continue;
            }
            let closest = closest_bone_def(chain, co, max_radius);

            let falloff = (max_radius - closest.distance).clamp(0.0, max_radius);
            let mut weight = variances[b] * (falloff / max_radius) / num_bones as f64;

            let bone_fac = if policy.full_root_segment || closest.index != 0 {
                1.0
            } else {
                closest.fac
            };
            weight *= bone_fac.min(card_fac).max(0.0);
            weight = weight.max(min_weight);

            let name = &chain[closest.index].name;
            for &v in vert_loop {
                store.set_weight(name, v, weight)?;
                if policy.pin_root_weight {
                    store.set_weight(&chain[0].name, v, 1.0 - max_weight)?;
                }
            }
        }
    }

    Ok(())
}

/// Bind every card to its closest chains.
///
/// Cards whose median has no length are skipped. The number of chains per
/// card is `min(max_bones, chains.len())`.
pub fn assign_bones<W, I, R>(
    store: &mut W,
    cards: &[Card<I>],
    chains: &[BoneChain],
    config: &HairRigConfig,
    rng: &mut R,
) -> Result<usize>
where
    W: WeightStore<I> + ?Sized,
    I: MeshIndex,
    R: Rng,
{
    config.validate()?;
    if chains.is_empty() {
        return Ok(0);
    }

    let mut bound = 0;
    for card in cards {
        if loop_length(&card.median) <= 0.0 {
            debug!("card median has no length, skipping");
            continue;
        }
        let order = rank_chains(chains, &card.median, config.max_radius, config.parallel);
        let closest: Vec<&BoneChain> = order
            .iter()
            .take(config.max_bones)
            .map(|&i| &chains[i])
            .collect();
        weight_card_to_bones(store, card, &closest, config, rng)?;
        bound += 1;
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigTarget;
    use crate::mesh::VertexId;
    use crate::rig::BoneDef;
    use crate::weights::WeightMap;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// A two-bone chain hanging straight down from `(x, 0, 1)` to `(x, 0, 0)`.
    fn chain(prefix: &str, x: f64) -> BoneChain {
        vec![
            BoneDef::new(format!("{}_0", prefix), Point3::new(x, 0.0, 1.0), Point3::new(x, 0.0, 0.5)),
            BoneDef::new(format!("{}_1", prefix), Point3::new(x, 0.0, 0.5), Point3::new(x, 0.0, 0.0)),
        ]
    }

    /// A card with `n` median points from `(x, 0, 1)` down to `(x, 0, 0)`,
    /// two vertices per loop.
    fn card(x: f64, n: usize) -> Card {
        let median = (0..n)
            .map(|i| Point3::new(x, 0.0, 1.0 - i as f64 / (n - 1) as f64))
            .collect();
        let loops = (0..n)
            .map(|i| vec![VertexId::new(2 * i), VertexId::new(2 * i + 1)])
            .collect();
        Card { median, loops }
    }

    fn config() -> HairRigConfig {
        HairRigConfig::default()
            .with_max_radius(0.1)
            .with_variance(0.0)
            .with_curve_exponent(1.0)
    }

    #[test]
    fn test_closest_bone() {
        let c = chain("a", 0.0);
        let hit = closest_bone_def(&c, &Point3::new(0.01, 0.0, 0.25), 0.1);
        assert_eq!(hit.index, 1);
        assert_relative_eq!(hit.distance, 0.01, epsilon = 1e-12);
        assert_relative_eq!(hit.fac, 0.5, epsilon = 1e-12);

        let miss = closest_bone_def(&c, &Point3::new(1.0, 0.0, 0.5), 0.1);
        assert_eq!(miss, ClosestBone { index: 0, distance: 0.2, fac: 0.0 });
    }

    #[test]
    fn test_weighted_distance_favors_tip_agreement() {
        let m = card(0.0, 5).median;
        assert_relative_eq!(weighted_bone_distance(&chain("a", 0.0), &m, 0.1), 0.0, epsilon = 1e-12);

        // diverging at the tip costs more than diverging at the root
        let root_off = vec![
            BoneDef::new("r", Point3::new(0.05, 0.0, 1.0), Point3::new(0.0, 0.0, 0.5)),
            BoneDef::new("r1", Point3::new(0.0, 0.0, 0.5), Point3::new(0.0, 0.0, 0.0)),
        ];
        let tip_off = vec![
            BoneDef::new("t", Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 0.5)),
            BoneDef::new("t1", Point3::new(0.0, 0.0, 0.5), Point3::new(0.05, 0.0, 0.0)),
        ];
        assert!(weighted_bone_distance(&root_off, &m, 0.1) < weighted_bone_distance(&tip_off, &m, 0.1));
    }

    #[test]
    fn test_rank_is_stable_and_mode_independent() {
        let chains = vec![chain("far", 0.08), chain("near", 0.01), chain("same", 0.01)];
        let m = card(0.0, 5).median;
        assert_eq!(rank_chains(&chains, &m, 0.1, true), vec![1, 2, 0]);
        assert_eq!(rank_chains(&chains, &m, 0.1, false), vec![1, 2, 0]);
    }

    #[test]
    fn test_standard_weights_fade_in() {
        let chains = vec![chain("a", 0.0)];
        let mut store: WeightMap = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let bound = assign_bones(&mut store, &[card(0.0, 5)], &chains, &config(), &mut rng).unwrap();
        assert_eq!(bound, 1);

        // root point: zero along the first bone and along the card
        assert_eq!(store.weight("a_0", VertexId::new(0)), Some(0.0));
        // second point sits on bone 0 at fac 0.5, card fac 0.25
        assert_relative_eq!(store.weight("a_0", VertexId::new(2)).unwrap(), 0.25, epsilon = 1e-12);
        // tip points lie on bone 1: card fac alone
        assert_relative_eq!(store.weight("a_1", VertexId::new(6)).unwrap(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(store.weight("a_1", VertexId::new(9)).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_max_bones_splits_weight() {
        let chains = vec![chain("a", 0.0), chain("b", 0.05), chain("c", 0.09)];
        let mut store: WeightMap = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = config().with_max_bones(2);
        assign_bones(&mut store, &[card(0.0, 5)], &chains, &config, &mut rng).unwrap();

        assert!(!store.has_group("c_0") && !store.has_group("c_1"));
        assert_relative_eq!(store.weight("a_1", VertexId::new(8)).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(store.weight("b_1", VertexId::new(8)).unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_spring_pins_root_bone() {
        let chains = vec![chain("a", 0.0)];
        let mut store: WeightMap = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = config().with_rig_target(RigTarget::Spring).with_max_weight(0.8);
        assign_bones(&mut store, &[card(0.0, 5)], &chains, &config, &mut rng).unwrap();

        // root bone takes the pinned weight, the rest never drop below the floor
        for v in 0..10 {
            assert_relative_eq!(store.weight("a_0", VertexId::new(v)).unwrap(), 0.2, epsilon = 1e-12);
        }
        assert_relative_eq!(store.weight("a_1", VertexId::new(6)).unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_seed_reproduces_weights() {
        let chains = vec![chain("a", 0.0), chain("b", 0.03)];
        let config = HairRigConfig::default().with_max_radius(0.1).with_variance(0.5);
        let run = |seed| {
            let mut store: WeightMap = WeightMap::new();
            let mut rng = StdRng::seed_from_u64(seed);
            assign_bones(&mut store, &[card(0.0, 7), card(0.02, 7)], &chains, &config, &mut rng).unwrap();
            store
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn test_zero_length_card_skipped() {
        let chains = vec![chain("a", 0.0)];
        let flat = Card {
            median: vec![Point3::new(0.0, 0.0, 1.0); 3],
            loops: vec![vec![VertexId::new(0)]; 3],
        };
        let mut store: WeightMap = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(assign_bones(&mut store, &[flat], &chains, &config(), &mut rng).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_variance_is_rejected() {
        let chains = vec![chain("a", 0.0)];
        let mut config = config();
        config.variance = -0.5;
        let mut store: WeightMap = WeightMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        let result = assign_bones(&mut store, &[card(0.0, 5)], &chains, &config, &mut rng);
        assert!(matches!(result, Err(crate::error::TressError::InvalidParameter { .. })));
        assert!(store.is_empty());
    }
}
