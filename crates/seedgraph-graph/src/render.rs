//! Rendering and inspection helpers.
//!
//! Output formats:
//! - Graphviz DOT (undirected, colored by element type, pen width by weight)
//! - JSON snapshot (nodes, edges, co-occurrence counters)
//! - summary statistics for logs and CLI reports

use crate::element::ElementType;
use crate::graph::{CooccurrenceGraph, Edge, Node, NodeKey};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Dot,
    Json,
}

impl GraphFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown graph format `{other}` (expected dot|json)")),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

pub fn type_color(ty: &ElementType) -> &'static str {
    match ty {
        ElementType::Entities => "#ff7f0e",
        ElementType::NounPhrases => "#1f77b4",
        ElementType::Verbs => "#2ca02c",
        ElementType::Concepts => "#d62728",
        ElementType::Other(_) => "#808080",
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub min_weight: Option<f64>,
    pub max_weight: Option<f64>,
}

pub fn graph_stats(graph: &CooccurrenceGraph) -> GraphStats {
    let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *nodes_by_type
            .entry(node.element_type().to_string())
            .or_default() += 1;
    }
    let (min_weight, max_weight) = weight_range(graph.edges()).unzip();
    GraphStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        nodes_by_type,
        min_weight,
        max_weight,
    }
}

fn weight_range(edges: &[Edge]) -> Option<(f64, f64)> {
    edges.iter().map(|e| e.weight).fold(None, |acc, w| match acc {
        None => Some((w, w)),
        Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
    })
}

// ============================================================================
// DOT
// ============================================================================

pub fn render_dot(graph: &CooccurrenceGraph, title: Option<&str>) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    let range = weight_range(graph.edges());
    let pen_width = |w: f64| -> f64 {
        match range {
            Some((lo, hi)) if hi > lo => (w - lo) / (hi - lo) * 4.0 + 1.0,
            _ => 2.5,
        }
    };

    let caption = match range {
        None => "No edges present".to_string(),
        Some((lo, hi)) if hi > lo => format!("Edge weights: {lo:.2} to {hi:.2}"),
        Some((_, hi)) => format!("Uniform edge weight: {hi:.2}"),
    };
    let heading = match title {
        Some(t) => format!("{t} knowledge graph\\n{caption}"),
        None => format!("Knowledge graph\\n{caption}"),
    };

    let mut out = String::new();
    out.push_str("graph seedgraph {\n");
    out.push_str("  layout=neato;\n  overlap=false;\n");
    let _ = writeln!(out, "  label=\"{}\";", dot_escape(&heading));
    out.push_str("  node [shape=ellipse, style=filled, fontname=\"Helvetica\", fontsize=8];\n");
    out.push_str("  edge [color=\"#CCCCCC\", fontsize=6];\n\n");

    for node in graph.nodes() {
        let size = if *node.element_type() == ElementType::Entities {
            "1.2"
        } else {
            "0.8"
        };
        let _ = writeln!(
            out,
            "  n{} [label=\"{}\", fillcolor=\"{}\", width={size}, tooltip=\"{}\"];",
            node.id,
            dot_escape(node.text()),
            type_color(node.element_type()),
            dot_escape(&node.key.to_string()),
        );
    }
    if !graph.edges().is_empty() {
        out.push('\n');
    }
    for edge in graph.edges() {
        let _ = writeln!(
            out,
            "  n{} -- n{} [penwidth={:.2}, label=\"{:.2}\"];",
            edge.source,
            edge.target,
            pen_width(edge.weight),
            edge.weight
        );
    }
    out.push_str("}\n");
    out
}

// ============================================================================
// JSON snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooccurrenceEntry {
    pub a: NodeKey,
    pub b: NodeKey,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub stats: GraphStats,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub cooccurrence: Vec<CooccurrenceEntry>,
}

pub fn snapshot(graph: &CooccurrenceGraph) -> GraphSnapshot {
    GraphSnapshot {
        stats: graph_stats(graph),
        nodes: graph.nodes().to_vec(),
        edges: graph.edges().to_vec(),
        cooccurrence: graph
            .cooccurrence_counts()
            .into_iter()
            .map(|(a, b, count)| CooccurrenceEntry {
                a: a.clone(),
                b: b.clone(),
                count,
            })
            .collect(),
    }
}

pub fn render(graph: &CooccurrenceGraph, format: GraphFormat, title: Option<&str>) -> Result<String> {
    match format {
        GraphFormat::Dot => Ok(render_dot(graph, title)),
        GraphFormat::Json => Ok(serde_json::to_string_pretty(&snapshot(graph))?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementSet};

    fn sample_graph() -> CooccurrenceGraph {
        let mut g = CooccurrenceGraph::new();
        g.add_query_elements(
            "q1",
            &ElementSet::new()
                .with("entities", [Element::labeled("Austin \"TX\"", "GPE")])
                .with("noun_phrases", ["vegan food"])
                .with("verbs", ["serve"]),
        );
        g
    }

    #[test]
    fn stats_count_types_and_weights() {
        let stats = graph_stats(&sample_graph());
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 3);
        assert_eq!(stats.nodes_by_type["verbs"], 1);
        assert_eq!(stats.min_weight, Some(1.0));
        assert_eq!(stats.max_weight, Some(1.2));
    }

    #[test]
    fn dot_output_escapes_and_scales() {
        let dot = render_dot(&sample_graph(), Some("food"));
        assert!(dot.starts_with("graph seedgraph {"));
        assert!(dot.contains("Austin \\\"TX\\\""));
        assert!(dot.contains("fillcolor=\"#ff7f0e\""));
        assert!(dot.contains("penwidth=5.00, label=\"1.20\""));
        assert!(dot.contains("penwidth=1.00, label=\"1.00\""));
        assert!(dot.contains("Edge weights: 1.00 to 1.20"));
    }

    #[test]
    fn empty_graph_renders() {
        let dot = render_dot(&CooccurrenceGraph::new(), None);
        assert!(dot.contains("No edges present"));
        let json = render(&CooccurrenceGraph::new(), GraphFormat::Json, None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["stats"]["nodes"], 0);
    }
}
