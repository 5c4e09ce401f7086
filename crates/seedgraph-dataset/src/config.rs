//! Run configuration.
//!
//! A [`RunConfig`] is a plain value passed by reference to every orchestrator.
//! It can be loaded from JSON; any field left out takes its default.

use crate::error::{DatasetError, Result};
use seedgraph_graph::SamplingPlan;
use seedgraph_llm::AnswerSelection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "generated_datasets";
pub const DEFAULT_DOMAIN: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Related pairs drawn per element type per generated question.
    pub plan: SamplingPlan,
    /// Questions generated from the graph, per domain.
    pub num_questions: usize,
    /// Questions generated per seed by the expansion pipeline.
    pub questions_per_seed: usize,
    /// `llm`, `datastore`, `google`, `all` or `none`.
    pub answer_source: String,
    /// Fixed sampler seed; entropy when absent.
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    /// Domain for seed files without domain grouping.
    pub domain: String,
    /// Target question count for document QA generation.
    pub total_document_questions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_chars: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            plan: SamplingPlan::default(),
            num_questions: 5,
            questions_per_seed: 3,
            answer_source: "llm".to_string(),
            seed: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            domain: DEFAULT_DOMAIN.to_string(),
            total_document_questions: 100,
            chunk_size: 3000,
            chunk_overlap: 1000,
            min_chunk_chars: 200,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| DatasetError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| DatasetError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if !(self.plan.min_weight.is_finite() && self.plan.min_weight >= 0.0) {
            return Err(format!(
                "plan.min_weight must be a finite, non-negative number (got {})",
                self.plan.min_weight
            ));
        }
        Ok(())
    }

    pub fn answer_selection(&self) -> AnswerSelection {
        AnswerSelection::parse(&self.answer_source)
    }
}
