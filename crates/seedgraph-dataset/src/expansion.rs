//! Per-seed query expansion.
//!
//! Each seed is extracted on its own, expanded into `n` related questions and
//! optionally answered by one or more answer sources. Results render as a
//! console report or as the `query_results.csv` table.

use crate::error::Result;
use crate::seeds::SeedQuery;
use crate::table::Table;
use seedgraph_extract::ElementExtractor;
use seedgraph_llm::{
    parse_questions, question_prompt, AnswerGenerator, AnswerSelection, AnswerSourceKind,
    TextGenerator,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

pub const QUERY_RESULTS_FILE: &str = "query_results.csv";
pub const BASE_COLUMNS: [&str; 3] = ["query_id", "original_query", "generated_question"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Text,
    Csv,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "csv" | "dataframe" | "table" => Some(Self::Csv),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn wants_text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }

    pub fn wants_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query_id: String,
    pub original_query: String,
    pub generated_questions: Vec<String>,
    /// `(question, answer)` per invoked source, in question order.
    pub qa_pairs: BTreeMap<AnswerSourceKind, Vec<(String, String)>>,
}

pub struct QueryExpander<'a> {
    extractor: &'a dyn ElementExtractor,
    generator: &'a dyn TextGenerator,
    answers: AnswerGenerator<'a>,
}

impl<'a> QueryExpander<'a> {
    pub fn new(
        extractor: &'a dyn ElementExtractor,
        generator: &'a dyn TextGenerator,
        answers: AnswerGenerator<'a>,
    ) -> Self {
        Self {
            extractor,
            generator,
            answers,
        }
    }

    /// Extraction and question failures abort; answer failures are recorded
    /// in the answer text.
    pub fn process_query(
        &self,
        seed: &SeedQuery,
        num_questions: usize,
        selection: AnswerSelection,
    ) -> Result<QueryResult> {
        tracing::info!(query_id = %seed.id, query = %seed.query, "processing query");
        let elements = self.extractor.extract(&seed.query)?;
        let reply = self
            .generator
            .generate(&question_prompt(&elements, num_questions))?;
        let questions = parse_questions(&reply);
        if questions.is_empty() {
            tracing::warn!(query_id = %seed.id, "model reply contained no questions");
        }

        let mut qa_pairs = BTreeMap::new();
        for kind in selection.sources() {
            qa_pairs.insert(kind, self.answers.generate_answers(&questions, kind));
        }

        Ok(QueryResult {
            query_id: seed.id.clone(),
            original_query: seed.query.clone(),
            generated_questions: questions,
            qa_pairs,
        })
    }

    pub fn process_queries(
        &self,
        seeds: &[SeedQuery],
        num_questions: usize,
        selection: AnswerSelection,
    ) -> Result<Vec<QueryResult>> {
        seeds
            .iter()
            .map(|seed| self.process_query(seed, num_questions, selection))
            .collect()
    }
}

/// One row per generated question; one `<source>_answer` column per source
/// seen anywhere in `results`, sorted by name. Missing answers stay blank.
pub fn results_table(results: &[QueryResult]) -> Table {
    let answer_columns: BTreeSet<String> = results
        .iter()
        .flat_map(|r| r.qa_pairs.keys())
        .map(AnswerSourceKind::column_name)
        .collect();
    let mut table = Table::new(
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(answer_columns),
    );

    for result in results {
        for question in &result.generated_questions {
            let mut record = BTreeMap::from([
                ("query_id".to_string(), result.query_id.clone()),
                ("original_query".to_string(), result.original_query.clone()),
                ("generated_question".to_string(), question.clone()),
            ]);
            for (kind, pairs) in &result.qa_pairs {
                if let Some((_, answer)) = pairs.iter().rev().find(|(q, _)| q == question) {
                    record.insert(kind.column_name(), answer.clone());
                }
            }
            table.push_record(&record);
        }
    }
    table
}

pub fn render_text_report(results: &[QueryResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(
            out,
            "\nOriginal Query ({}): {}",
            result.query_id, result.original_query
        );
        let _ = writeln!(out, "{}", "-".repeat(50));
        out.push_str("\nGenerated Questions:\n");
        for question in &result.generated_questions {
            let _ = writeln!(out, "- {question}");
        }

        if !result.qa_pairs.is_empty() {
            out.push_str("\nAnswers:\n");
            for (kind, pairs) in &result.qa_pairs {
                let _ = writeln!(out, "\n{} Answers:", kind.as_str().to_uppercase());
                for (question, answer) in pairs {
                    let _ = writeln!(out, "Q: {question}");
                    let _ = writeln!(out, "A: {answer}\n");
                }
            }
        }
    }
    out
}
