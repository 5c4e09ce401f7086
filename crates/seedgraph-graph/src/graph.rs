//! The weighted co-occurrence graph.
//!
//! Nodes are keyed by `(element type, text)` and remember the query that most
//! recently touched them. Every call to [`CooccurrenceGraph::add_query_elements`]
//! connects all nodes currently stamped with that call's query id, recomputing
//! each edge's weight from scratch:
//!
//! ```text
//! weight = 1.0
//!        × type_multiplier(sorted(type_a, type_b))   // table lookup, 1.0 if absent
//!        × same_type_bonus                           // only when type_a == type_b
//!        × min(1 + (calls(a, b) - 1) × step, cap)    // co-occurrence frequency
//! ```
//!
//! `calls(a, b)` counts weight calculations for the pair, so re-encountering a
//! pair raises its weight until the frequency multiplier saturates.
//!
//! Query-id stamping is overwrite-only: a node seen in `q1` and later in `q2`
//! belongs to `q2` from then on, and is no longer paired with the `q1` nodes
//! that were not re-encountered.

use crate::element::{ElementSet, ElementType};
use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense node identifier; ids are assigned in insertion order.
pub type NodeId = u32;

/// Graph identity of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub element_type: ElementType,
    pub text: String,
}

impl NodeKey {
    pub fn new(element_type: impl Into<ElementType>, text: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element_type, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub key: NodeKey,
    pub label: Option<String>,
    /// Most recent query that touched this node.
    pub query_id: String,
}

impl Node {
    pub fn element_type(&self) -> &ElementType {
        &self.key.element_type
    }

    pub fn text(&self) -> &str {
        &self.key.text
    }
}

/// Undirected weighted edge; `source < target` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub query_id: String,
}

// ============================================================================
// Weight rules
// ============================================================================

/// Parameters of the edge-weight formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightRules {
    /// Multipliers keyed by unordered type pair.
    pub type_multipliers: Vec<TypeMultiplier>,
    /// Extra factor when both endpoints share a type.
    pub same_type_bonus: f64,
    /// Frequency multiplier increment per repeated co-occurrence.
    pub frequency_step: f64,
    /// Upper bound of the frequency multiplier.
    pub frequency_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMultiplier {
    pub types: (ElementType, ElementType),
    pub multiplier: f64,
}

impl TypeMultiplier {
    fn new(a: ElementType, b: ElementType, multiplier: f64) -> Self {
        Self {
            types: (a, b),
            multiplier,
        }
    }

    fn matches(&self, a: &ElementType, b: &ElementType) -> bool {
        let (x, y) = &self.types;
        (x == a && y == b) || (x == b && y == a)
    }
}

impl Default for WeightRules {
    fn default() -> Self {
        use ElementType::*;
        Self {
            type_multipliers: vec![
                // Named entities are the strongest signal.
                TypeMultiplier::new(Entities, Entities, 2.0),
                TypeMultiplier::new(Entities, Concepts, 1.5),
                // Action relationships.
                TypeMultiplier::new(NounPhrases, Verbs, 1.2),
                TypeMultiplier::new(Concepts, Concepts, 1.3),
                TypeMultiplier::new(Verbs, Verbs, 0.8),
            ],
            same_type_bonus: 1.1,
            frequency_step: 0.2,
            frequency_cap: 2.0,
        }
    }
}

impl WeightRules {
    /// Table multiplier for an unordered type pair (1.0 when absent).
    pub fn type_multiplier(&self, a: &ElementType, b: &ElementType) -> f64 {
        self.type_multipliers
            .iter()
            .find(|m| m.matches(a, b))
            .map(|m| m.multiplier)
            .unwrap_or(1.0)
    }

    /// Frequency multiplier after `count` weight calculations for a pair.
    pub fn frequency_multiplier(&self, count: u32) -> f64 {
        let repeats = count.saturating_sub(1) as f64;
        (1.0 + repeats * self.frequency_step).min(self.frequency_cap)
    }

    /// Weight before frequency scaling.
    pub fn base_weight(&self, a: &ElementType, b: &ElementType) -> f64 {
        let mut weight = self.type_multiplier(a, b);
        if a == b {
            weight *= self.same_type_bonus;
        }
        weight
    }
}

// ============================================================================
// Graph
// ============================================================================

fn ordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Incrementally built co-occurrence graph.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    rules: WeightRules,
    nodes: Vec<Node>,
    node_index: AHashMap<NodeKey, NodeId>,
    edges: Vec<Edge>,
    edge_index: AHashMap<(NodeId, NodeId), usize>,
    /// Nodes grouped by their current `query_id`.
    query_index: AHashMap<String, RoaringBitmap>,
    cooccurrence_counts: AHashMap<(NodeKey, NodeKey), u32>,
}

impl CooccurrenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: WeightRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn rules(&self) -> &WeightRules {
        &self.rules
    }

    /// Ingest one query's elements: upsert their nodes, then connect every
    /// node stamped with `query_id`.
    pub fn add_query_elements(&mut self, query_id: &str, elements: &ElementSet) {
        for (element_type, element) in elements.iter() {
            let key = NodeKey::new(element_type.clone(), element.text());
            self.upsert_node(key, element.label(), query_id);
        }

        let Some(members) = self.query_index.get(query_id).cloned() else {
            return;
        };

        // Ascending ids == node insertion order.
        let ids: Vec<NodeId> = members.iter().collect();
        let mut touched_edges = 0usize;
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let key_a = self.nodes[a as usize].key.clone();
                let key_b = self.nodes[b as usize].key.clone();
                let weight = self.calculate_edge_weight(&key_a, &key_b);
                let edge_query = self.nodes[a as usize].query_id.clone();
                self.upsert_edge(a, b, weight, edge_query);
                touched_edges += 1;
            }
        }

        tracing::debug!(
            query_id,
            elements = elements.len(),
            pairs = touched_edges,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "added query elements"
        );
    }

    /// Compute the weight for a node pair and record one more co-occurrence.
    ///
    /// Every call increments the pair's counter, whether or not the pair is
    /// new, so repeated calls raise the returned weight until the frequency
    /// multiplier reaches its cap.
    pub fn calculate_edge_weight(&mut self, a: &NodeKey, b: &NodeKey) -> f64 {
        let base = self.rules.base_weight(&a.element_type, &b.element_type);

        let pair = ordered(a.clone(), b.clone());
        let count = self.cooccurrence_counts.entry(pair).or_insert(0);
        *count += 1;

        base * self.rules.frequency_multiplier(*count)
    }

    /// Pairs of texts for edges whose endpoints both have `element_type` and
    /// whose weight is at least `min_weight`. Order is unspecified.
    pub fn get_related_elements(
        &self,
        element_type: &ElementType,
        min_weight: f64,
    ) -> Vec<(String, String)> {
        self.edges
            .iter()
            .filter(|e| e.weight >= min_weight)
            .filter_map(|e| {
                let a = &self.nodes[e.source as usize];
                let b = &self.nodes[e.target as usize];
                (a.element_type() == element_type && b.element_type() == element_type)
                    .then(|| (a.text().to_string(), b.text().to_string()))
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.node_index.get(key).map(|&id| &self.nodes[id as usize])
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Order-independent edge lookup.
    pub fn edge_between(&self, a: &NodeKey, b: &NodeKey) -> Option<&Edge> {
        let a = *self.node_index.get(a)?;
        let b = *self.node_index.get(b)?;
        self.edge_index
            .get(&ordered(a, b))
            .map(|&idx| &self.edges[idx])
    }

    /// Number of weight calculations recorded for an unordered pair.
    pub fn cooccurrence_count(&self, a: &NodeKey, b: &NodeKey) -> u32 {
        self.cooccurrence_counts
            .get(&ordered(a.clone(), b.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Co-occurrence counters in canonical pair order.
    pub fn cooccurrence_counts(&self) -> Vec<(&NodeKey, &NodeKey, u32)> {
        let mut out: Vec<_> = self
            .cooccurrence_counts
            .iter()
            .map(|((a, b), &count)| (a, b, count))
            .collect();
        out.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        out
    }

    /// Ids of nodes currently stamped with `query_id`.
    pub fn nodes_for_query(&self, query_id: &str) -> RoaringBitmap {
        self.query_index.get(query_id).cloned().unwrap_or_default()
    }

    fn upsert_node(&mut self, key: NodeKey, label: Option<&str>, query_id: &str) -> NodeId {
        if let Some(&id) = self.node_index.get(&key) {
            let node = &mut self.nodes[id as usize];
            if node.query_id != query_id {
                if let Some(old) = self.query_index.get_mut(&node.query_id) {
                    old.remove(id);
                    if old.is_empty() {
                        self.query_index.remove(&node.query_id);
                    }
                }
                node.query_id = query_id.to_string();
            }
            if let Some(label) = label {
                node.label = Some(label.to_string());
            }
            self.query_index
                .entry(query_id.to_string())
                .or_default()
                .insert(id);
            return id;
        }

        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            id,
            key: key.clone(),
            label: label.map(str::to_string),
            query_id: query_id.to_string(),
        });
        self.node_index.insert(key, id);
        self.query_index
            .entry(query_id.to_string())
            .or_default()
            .insert(id);
        id
    }

    fn upsert_edge(&mut self, a: NodeId, b: NodeId, weight: f64, query_id: String) {
        let (source, target) = ordered(a, b);
        match self.edge_index.get(&(source, target)) {
            Some(&idx) => {
                let edge = &mut self.edges[idx];
                edge.weight = weight;
                edge.query_id = query_id;
            }
            None => {
                self.edge_index.insert((source, target), self.edges.len());
                self.edges.push(Edge {
                    source,
                    target,
                    weight,
                    query_id,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use approx::assert_relative_eq;

    fn key(ty: &str, text: &str) -> NodeKey {
        NodeKey::new(ty, text)
    }

    #[test]
    fn weight_table_first_occurrence() {
        let mut g = CooccurrenceGraph::new();
        let cases = [
            ("entities", "entities", 2.2),
            ("concepts", "concepts", 1.43),
            ("noun_phrases", "verbs", 1.2),
            ("verbs", "noun_phrases", 1.2),
            ("verbs", "verbs", 0.88),
            ("entities", "concepts", 1.5),
            ("concepts", "entities", 1.5),
            ("entities", "verbs", 1.0),
            ("noun_phrases", "noun_phrases", 1.1),
        ];
        for (i, (t1, t2, expected)) in cases.iter().enumerate() {
            let w = g.calculate_edge_weight(&key(t1, &format!("a{i}")), &key(t2, &format!("b{i}")));
            assert_relative_eq!(w, *expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn frequency_multiplier_saturates_at_sixth_call() {
        let mut g = CooccurrenceGraph::new();
        let (a, b) = (key("concepts", "n1"), key("concepts", "n2"));
        let weights: Vec<f64> = (0..8).map(|_| g.calculate_edge_weight(&a, &b)).collect();

        for pair in weights[..6].windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert_relative_eq!(weights[5], 1.43 * 2.0, epsilon = 1e-9);
        assert_relative_eq!(weights[6], weights[5], epsilon = 1e-12);
        assert_relative_eq!(weights[7], weights[5], epsilon = 1e-12);
        assert_eq!(g.cooccurrence_count(&b, &a), 8);
    }

    #[test]
    fn single_query_builds_complete_graph() {
        let mut g = CooccurrenceGraph::new();
        let elements = ElementSet::new()
            .with("entities", [Element::labeled("Python", "LANGUAGE")])
            .with("noun_phrases", ["programming language"])
            .with("verbs", ["code"])
            .with("concepts", ["programming"]);

        g.add_query_elements("query1", &elements);

        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 6);
        let node = g.node(&key("entities", "Python")).unwrap();
        assert_eq!(node.label.as_deref(), Some("LANGUAGE"));
        assert_eq!(node.query_id, "query1");
    }

    #[test]
    fn shared_element_is_one_node_and_moves_to_latest_query() {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements(
            "q1",
            &ElementSet::new().with("concepts", ["food", "restaurants"]),
        );
        g.add_query_elements(
            "q2",
            &ElementSet::new().with("concepts", ["food", "cuisine"]),
        );

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.node(&key("concepts", "food")).unwrap().query_id, "q2");
        assert_eq!(g.edge_count(), 2);
        // The q1 pairing is not refreshed by the q2 call.
        assert_eq!(
            g.cooccurrence_count(&key("concepts", "food"), &key("concepts", "restaurants")),
            1
        );
        assert_eq!(g.nodes_for_query("q1").len(), 1);
        assert_eq!(g.nodes_for_query("q2").len(), 2);
    }

    #[test]
    fn repeated_pair_is_recomputed_not_accumulated() {
        let mut g = CooccurrenceGraph::new();
        let elements = ElementSet::new()
            .with("entities", [Element::labeled("Python", "LANG")])
            .with("concepts", ["programming"]);
        let (py, prog) = (key("entities", "Python"), key("concepts", "programming"));

        g.add_query_elements("q1", &elements);
        assert_relative_eq!(g.edge_between(&py, &prog).unwrap().weight, 1.5, epsilon = 1e-9);

        g.add_query_elements("q2", &elements);
        let edge = g.edge_between(&prog, &py).unwrap();
        assert_relative_eq!(edge.weight, 1.8, epsilon = 1e-9);
        assert_eq!(edge.query_id, "q2");
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn reused_query_id_pairs_with_earlier_members() {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements("q1", &ElementSet::new().with("verbs", ["visit"]));
        g.add_query_elements("q1", &ElementSet::new().with("verbs", ["explore"]));

        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.get_related_elements(&ElementType::Verbs, 0.0).len(), 1);
    }

    #[test]
    fn empty_element_set_changes_nothing() {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements("q1", &ElementSet::new().with("verbs", ["visit", "explore"]));
        let before = (g.node_count(), g.edge_count());

        g.add_query_elements("q2", &ElementSet::with_builtin_types());

        assert_eq!((g.node_count(), g.edge_count()), before);
    }

    #[test]
    fn colons_in_text_do_not_collide() {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements(
            "q1",
            &ElementSet::new()
                .with("concepts", ["a:b"])
                .with(ElementType::Other("concepts:a".to_string()), ["b"]),
        );
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn related_elements_filter_by_type_and_weight() {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements(
            "q1",
            &ElementSet::new()
                .with("verbs", ["serve", "eat"])
                .with("concepts", ["food", "vegan"]),
        );

        // verbs/verbs weight is 0.88 and falls under the default threshold.
        assert!(g.get_related_elements(&ElementType::Verbs, 1.0).is_empty());
        assert_eq!(g.get_related_elements(&ElementType::Verbs, 0.5).len(), 1);

        let concepts = g.get_related_elements(&ElementType::Concepts, 1.0);
        assert_eq!(concepts, vec![("food".to_string(), "vegan".to_string())]);
        assert!(g.get_related_elements(&ElementType::Entities, 0.0).is_empty());
    }
}
