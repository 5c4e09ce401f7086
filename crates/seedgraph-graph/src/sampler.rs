//! Random selection of related element pairs.

use crate::element::ElementType;
use crate::graph::CooccurrenceGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default minimum edge weight for a pair to count as related.
pub const DEFAULT_MIN_WEIGHT: f64 = 1.0;

/// How many related pairs to draw per element type in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPlan {
    pub counts: BTreeMap<ElementType, usize>,
    pub min_weight: f64,
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self {
            counts: BTreeMap::from([
                (ElementType::Entities, 2),
                (ElementType::NounPhrases, 2),
                (ElementType::Verbs, 1),
                (ElementType::Concepts, 2),
            ]),
            min_weight: DEFAULT_MIN_WEIGHT,
        }
    }
}

/// One round's draw: related pairs per element type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledCombination {
    pub pairs: BTreeMap<ElementType, Vec<(String, String)>>,
}

impl SampledCombination {
    pub fn total_pairs(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_pairs() == 0
    }
}

/// Uniform sampler over a graph's related pairs.
pub struct RelationSampler {
    rng: StdRng,
}

impl RelationSampler {
    /// Sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampler for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `min(count, available)` related pairs of `element_type`, without
    /// replacement. No related pairs yields an empty vector.
    pub fn sample(
        &mut self,
        graph: &CooccurrenceGraph,
        element_type: &ElementType,
        count: usize,
        min_weight: f64,
    ) -> Vec<(String, String)> {
        let available = graph.get_related_elements(element_type, min_weight);
        if available.is_empty() || count == 0 {
            return Vec::new();
        }
        let take = count.min(available.len());
        available
            .choose_multiple(&mut self.rng, take)
            .cloned()
            .collect()
    }

    /// Draw one combination according to `plan`; each type is sampled
    /// independently.
    pub fn sample_combination(
        &mut self,
        graph: &CooccurrenceGraph,
        plan: &SamplingPlan,
    ) -> SampledCombination {
        let mut combination = SampledCombination::default();
        for (element_type, count) in &plan.counts {
            let pairs = self.sample(graph, element_type, *count, plan.min_weight);
            combination.pairs.insert(element_type.clone(), pairs);
        }
        combination
    }
}

impl Default for RelationSampler {
    fn default() -> Self {
        Self::new()
    }
}
