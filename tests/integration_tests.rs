//! Integration tests for the complete seedgraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Extraction → Accumulator → Sampler
//! - Sampler → Prompt → Mock model → Parsed pairs
//! - Expansion / document pipelines → CSV artifacts
//!
//! Run with: cargo test --test integration_tests

use approx::assert_relative_eq;
use seedgraph_dataset::{
    dataset_table, load_documents, results_table, ChunkOptions, DocumentQaGenerator,
    GoldenDatasetGenerator, QueryExpander, RunConfig, SeedQuery, SeedSet, Table,
};
use seedgraph_extract::{ElementExtractor, HeuristicExtractor, StaticExtractor};
use seedgraph_graph::{
    render, snapshot, CooccurrenceGraph, Element, ElementSet, ElementType, GraphFormat, NodeKey,
    RelationSampler, SamplingPlan,
};
use seedgraph_llm::{
    AnswerGenerator, AnswerSelection, LlmAnswerer, LlmClient, ScriptedGenerator,
    ANSWER_ERROR_PREFIX, MISSING_ANSWER,
};
use std::collections::BTreeMap;
use tempfile::tempdir;

// ============================================================================
// Extraction → graph
// ============================================================================

#[test]
fn test_heuristic_extraction_feeds_graph() {
    let extractor = HeuristicExtractor::new().unwrap();
    let mut graph = CooccurrenceGraph::new();

    let q1 = extractor
        .extract("What are popular attractions to visit in Seattle?")
        .unwrap();
    let q2 = extractor
        .extract("Which popular attractions in Seattle open early?")
        .unwrap();
    graph.add_query_elements("q1", &q1);
    let nodes_after_q1 = graph.node_count();
    graph.add_query_elements("q2", &q2);

    // Seattle, popular and attractions are shared: one node each.
    let seattle = NodeKey::new(ElementType::Entities, "Seattle");
    assert!(graph.node(&seattle).is_some());
    assert_eq!(graph.node(&seattle).unwrap().query_id, "q2");
    assert!(graph.node_count() > nodes_after_q1);

    let related = graph.get_related_elements(&ElementType::Concepts, 1.0);
    assert!(related.iter().any(|(a, b)| {
        (a == "popular" && b == "attractions") || (a == "attractions" && b == "popular")
    }));

    // The shared concept pair was weighed twice: 1.3 * 1.1 * 1.2.
    let popular = NodeKey::new(ElementType::Concepts, "popular");
    let attractions = NodeKey::new(ElementType::Concepts, "attractions");
    assert_eq!(graph.cooccurrence_count(&popular, &attractions), 2);
    assert_relative_eq!(
        graph.edge_between(&popular, &attractions).unwrap().weight,
        1.3 * 1.1 * 1.2,
        epsilon = 1e-9
    );
}

#[test]
fn test_labels_do_not_split_nodes() {
    let mut graph = CooccurrenceGraph::new();
    graph.add_query_elements(
        "q1",
        &ElementSet::new().with("entities", [Element::labeled("Python", "LANG"), "Rust".into()]),
    );
    graph.add_query_elements(
        "q2",
        &ElementSet::new().with("entities", [Element::labeled("Python", "ORG")]),
    );

    assert_eq!(graph.node_count(), 2);
    let python = graph
        .node(&NodeKey::new(ElementType::Entities, "Python"))
        .unwrap();
    assert_eq!(python.label.as_deref(), Some("ORG"));
}

#[test]
fn test_sampler_is_reproducible_with_seed() {
    let mut graph = CooccurrenceGraph::new();
    graph.add_query_elements(
        "q1",
        &ElementSet::new().with("concepts", ["food", "vegan", "restaurants", "austin", "menu"]),
    );
    let plan = SamplingPlan {
        counts: BTreeMap::from([(ElementType::Concepts, 3)]),
        ..SamplingPlan::default()
    };

    let a = RelationSampler::seeded(9).sample_combination(&graph, &plan);
    let b = RelationSampler::seeded(9).sample_combination(&graph, &plan);
    assert_eq!(a, b);
    assert_eq!(a.total_pairs(), 3);
}

// ============================================================================
// Graph → generation
// ============================================================================

#[test]
fn test_golden_generation_with_mock_client() {
    let extractor = StaticExtractor::new().with(
        "Best pizza in Chicago",
        ElementSet::new()
            .with(
                "entities",
                [Element::labeled("Chicago", "GPE"), Element::labeled("Lou Malnati's", "ORG")],
            )
            .with("noun_phrases", ["deep dish", "thin crust"])
            .with("verbs", ["eat", "order"])
            .with("concepts", ["pizza", "best"]),
    );
    let client = LlmClient::mock();
    let config = RunConfig {
        seed: Some(11),
        ..RunConfig::default()
    };

    let mut golden = GoldenDatasetGenerator::new(&extractor, &client, &config);
    golden.add_seed_query("Best pizza in Chicago", "q1").unwrap();
    let dataset = golden.generate_dataset(4).unwrap();

    assert_eq!(dataset.len(), 4);
    for item in &dataset {
        // verbs/verbs weighs 0.88 < 1.0, so no verb pairs are ever drawn.
        assert!(item.combination.pairs[&ElementType::Verbs].is_empty());
        assert_eq!(item.combination.pairs[&ElementType::Entities].len(), 1);
        assert_ne!(item.answer, MISSING_ANSWER);
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("food_dataset.csv");
    dataset_table(&dataset).write_csv(&path).unwrap();
    assert_eq!(Table::read_csv(&path).unwrap().len(), 4);
}

#[test]
fn test_graph_snapshot_renders_both_formats() {
    let mut graph = CooccurrenceGraph::new();
    graph.add_query_elements(
        "q1",
        &ElementSet::new()
            .with("entities", [Element::labeled("Python", "LANG")])
            .with("concepts", ["programming"]),
    );

    let json = render(&graph, GraphFormat::Json, None).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stats"]["edges"], 1);

    let dot = render(&graph, GraphFormat::Dot, Some("demo")).unwrap();
    assert!(dot.contains("label=\"1.50\""));
    assert_eq!(snapshot(&graph).cooccurrence.len(), 1);
}

// ============================================================================
// Expansion and documents
// ============================================================================

#[test]
fn test_expansion_records_answer_failures() {
    let seeds = SeedSet::parse("What restaurants serve vegan food in Austin?", "default")
        .unwrap()
        .all();
    let extractor = HeuristicExtractor::new().unwrap();
    let question_model =
        ScriptedGenerator::new().reply("Question: Is tofu vegan?\nQuestion: Where is Austin?");
    let answer_model = ScriptedGenerator::new().reply("Yes.").fail("quota exceeded");
    let answers = AnswerGenerator::new().with_source(LlmAnswerer::new(&answer_model));

    let expander = QueryExpander::new(&extractor, &question_model, answers);
    let results = expander
        .process_queries(&seeds, 2, AnswerSelection::parse("llm"))
        .unwrap();
    let table = results_table(&results);

    let answers = table.column("llm_answer").unwrap();
    assert_eq!(answers[0], "Yes.");
    assert!(answers[1].starts_with(ANSWER_ERROR_PREFIX));
    assert!(answers[1].contains("quota exceeded"));
    assert!(question_model.prompts()[0].contains("- Austin (PROPN)"));
}

#[test]
fn test_document_pipeline_from_disk() {
    let dir = tempdir().unwrap();
    let text = "The Space Needle was built for the 1962 World's Fair. ".repeat(10);
    std::fs::write(dir.path().join("needle.md"), &text).unwrap();
    std::fs::write(dir.path().join("notes.bin"), "ignored").unwrap();

    let documents = load_documents(dir.path()).unwrap();
    assert_eq!(documents.len(), 1);

    let client = LlmClient::mock();
    let pairs = DocumentQaGenerator::new(&client, ChunkOptions::default())
        .generate_dataset(&documents, 3);
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].doc_id, "needle.md");
    assert_eq!(
        pairs[0].answer,
        "The Space Needle was built for the 1962 World's Fair."
    );
}

#[test]
fn test_seed_ids_flow_into_graph() {
    let extractor = StaticExtractor::new()
        .with("a", ElementSet::new().with("concepts", ["alpha", "beta"]))
        .with("b", ElementSet::new().with("concepts", ["beta", "gamma"]));
    let client = LlmClient::mock();
    let config = RunConfig::default();
    let mut golden = GoldenDatasetGenerator::new(&extractor, &client, &config);
    for seed in [SeedQuery::new("s1", "a"), SeedQuery::new("s2", "b")] {
        golden.add_seed_query(&seed.query, &seed.id).unwrap();
    }
    let graph = golden.build_graph().unwrap();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    let beta = graph
        .node(&NodeKey::new(ElementType::Concepts, "beta"))
        .unwrap();
    assert_eq!(beta.query_id, "s2");
}
