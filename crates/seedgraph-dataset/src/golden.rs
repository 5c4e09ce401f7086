//! Graph-driven golden dataset generation.
//!
//! Seeds are extracted and accumulated into one [`CooccurrenceGraph`]; each
//! generated question comes from a fresh random draw of related element
//! pairs, turned into a prompt and parsed back into a question/answer pair.
//!
//! The generator moves through
//! `Empty -> SeedsLoaded -> GraphBuilt -> (Sampling -> Generating)* -> Done`
//! and never goes back. Out-of-order calls fail with
//! [`DatasetError::InvalidState`].

use crate::config::RunConfig;
use crate::error::{DatasetError, Result};
use crate::seeds::SeedQuery;
use crate::table::Table;
use seedgraph_extract::ElementExtractor;
use seedgraph_graph::{
    graph_stats, render_dot, CooccurrenceGraph, GraphStats, RelationSampler, SampledCombination,
    SamplingPlan,
};
use seedgraph_llm::{combination_prompt, parse_question_answer, TextGenerator};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Empty,
    SeedsLoaded,
    GraphBuilt,
    Sampling,
    Generating,
    Done,
}

impl GeneratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::SeedsLoaded => "seeds-loaded",
            Self::GraphBuilt => "graph-built",
            Self::Sampling => "sampling",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }
}

/// One generated row plus the draw it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: String,
    pub combination: SampledCombination,
}

/// `entities: a / b; concepts: c / d`
pub fn describe_combination(combination: &SampledCombination) -> String {
    let mut out = String::new();
    for (element_type, pairs) in &combination.pairs {
        if pairs.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("; ");
        }
        let _ = write!(out, "{element_type}: ");
        let rendered: Vec<String> = pairs.iter().map(|(a, b)| format!("{a} / {b}")).collect();
        out.push_str(&rendered.join(", "));
    }
    out
}

pub struct GoldenDatasetGenerator<'a> {
    extractor: &'a dyn ElementExtractor,
    generator: &'a dyn TextGenerator,
    graph: CooccurrenceGraph,
    sampler: RelationSampler,
    plan: SamplingPlan,
    seeds: Vec<SeedQuery>,
    state: GeneratorState,
}

impl<'a> GoldenDatasetGenerator<'a> {
    pub fn new(
        extractor: &'a dyn ElementExtractor,
        generator: &'a dyn TextGenerator,
        config: &RunConfig,
    ) -> Self {
        let sampler = match config.seed {
            Some(seed) => RelationSampler::seeded(seed),
            None => RelationSampler::new(),
        };
        Self {
            extractor,
            generator,
            graph: CooccurrenceGraph::new(),
            sampler,
            plan: config.plan.clone(),
            seeds: Vec::new(),
            state: GeneratorState::Empty,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn graph(&self) -> &CooccurrenceGraph {
        &self.graph
    }

    pub fn seeds(&self) -> &[SeedQuery] {
        &self.seeds
    }

    fn invalid(&self, action: &'static str) -> DatasetError {
        DatasetError::InvalidState {
            state: self.state.as_str(),
            action,
        }
    }

    /// Extract `query` and fold its elements into the graph under `query_id`.
    pub fn add_seed_query(&mut self, query: &str, query_id: &str) -> Result<()> {
        if !matches!(
            self.state,
            GeneratorState::Empty | GeneratorState::SeedsLoaded
        ) {
            return Err(self.invalid("add seed queries"));
        }
        let elements = self.extractor.extract(query)?;
        self.graph.add_query_elements(query_id, &elements);
        self.seeds.push(SeedQuery::new(query_id, query));
        self.state = GeneratorState::SeedsLoaded;
        tracing::info!(
            query_id,
            elements = elements.len(),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "seed added"
        );
        Ok(())
    }

    /// Close seed loading. The graph is final from here on.
    pub fn build_graph(&mut self) -> Result<&CooccurrenceGraph> {
        if self.state != GeneratorState::SeedsLoaded {
            return Err(self.invalid("build the graph"));
        }
        self.state = GeneratorState::GraphBuilt;
        tracing::info!(
            seeds = self.seeds.len(),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "graph built"
        );
        Ok(&self.graph)
    }

    /// Generate `num_questions` pairs. Builds the graph first when seeds are
    /// loaded but the graph is not yet closed. A generation failure aborts
    /// the batch.
    pub fn generate_dataset(&mut self, num_questions: usize) -> Result<Vec<GeneratedQuestion>> {
        if self.state == GeneratorState::SeedsLoaded {
            self.build_graph()?;
        }
        if self.state != GeneratorState::GraphBuilt {
            return Err(self.invalid("generate a dataset"));
        }

        let mut dataset = Vec::with_capacity(num_questions);
        for round in 0..num_questions {
            self.state = GeneratorState::Sampling;
            let combination = self.sampler.sample_combination(&self.graph, &self.plan);
            tracing::debug!(round, pairs = combination.total_pairs(), "round sampled");
            if combination.is_empty() {
                tracing::warn!(round, "no related elements above the weight threshold");
            }

            self.state = GeneratorState::Generating;
            let reply = self.generator.generate(&combination_prompt(&combination))?;
            let pair = parse_question_answer(&reply);
            if pair.is_incomplete() {
                tracing::warn!(round, "model reply missing question or answer");
            }
            tracing::info!(round, question = %pair.question, "pair generated");
            dataset.push(GeneratedQuestion {
                question: pair.question,
                answer: pair.answer,
                combination,
            });
        }
        self.state = GeneratorState::Done;
        Ok(dataset)
    }
}

pub fn dataset_table(dataset: &[GeneratedQuestion]) -> Table {
    let mut table = Table::new(["question", "answer", "elements"]);
    for item in dataset {
        table.push_row(vec![
            item.question.clone(),
            item.answer.clone(),
            describe_combination(&item.combination),
        ]);
    }
    table
}

// ============================================================================
// Domains
// ============================================================================

/// Filesystem-safe form of a domain name.
pub fn domain_file_stem(domain: &str) -> String {
    let stem: String = domain
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "domain".to_string()
    } else {
        stem
    }
}

#[derive(Debug, Clone)]
pub struct DomainReport {
    pub domain: String,
    pub dataset: Vec<GeneratedQuestion>,
    pub stats: GraphStats,
    pub dataset_path: PathBuf,
    pub graph_path: PathBuf,
}

/// Run one domain end to end with its own graph, writing
/// `<domain>_dataset.csv` and `<domain>_graph.dot` into `output_dir`.
pub fn generate_domain_dataset(
    extractor: &dyn ElementExtractor,
    generator: &dyn TextGenerator,
    domain: &str,
    seeds: &[SeedQuery],
    config: &RunConfig,
    output_dir: &Path,
) -> Result<DomainReport> {
    tracing::info!(domain, seeds = seeds.len(), "processing domain");
    let mut golden = GoldenDatasetGenerator::new(extractor, generator, config);
    for seed in seeds {
        golden.add_seed_query(&seed.query, &seed.id)?;
    }
    let dataset = golden.generate_dataset(config.num_questions)?;

    let stem = domain_file_stem(domain);
    let dataset_path = output_dir.join(format!("{stem}_dataset.csv"));
    dataset_table(&dataset).write_csv(&dataset_path)?;

    let graph_path = output_dir.join(format!("{stem}_graph.dot"));
    std::fs::write(&graph_path, render_dot(golden.graph(), Some(domain)))
        .map_err(|e| DatasetError::io(&graph_path, e))?;
    tracing::info!(domain, path = %graph_path.display(), "wrote graph");

    Ok(DomainReport {
        domain: domain.to_string(),
        stats: graph_stats(golden.graph()),
        dataset,
        dataset_path,
        graph_path,
    })
}
