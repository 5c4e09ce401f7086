//! Seedgraph: weighted co-occurrence graph over query elements.
//!
//! ```text
//!  seed query ──► extractor ──► ElementSet ──► CooccurrenceGraph ──► RelationSampler
//!                                 (typed)       (nodes keyed by        (related pairs
//!                                                type + text)           per type)
//! ```
//!
//! The graph is built once per generation run, in memory, single-threaded.
//! See [`graph`] for the weight formula and the query-id stamping rules.

pub mod element;
pub mod graph;
pub mod render;
pub mod sampler;

pub use element::{
    Element, ElementSet, ElementType, TYPE_CONCEPTS, TYPE_ENTITIES, TYPE_NOUN_PHRASES, TYPE_VERBS,
};
pub use graph::{CooccurrenceGraph, Edge, Node, NodeId, NodeKey, TypeMultiplier, WeightRules};
pub use render::{graph_stats, render, render_dot, snapshot, GraphFormat, GraphSnapshot, GraphStats};
pub use sampler::{RelationSampler, SampledCombination, SamplingPlan, DEFAULT_MIN_WEIGHT};
