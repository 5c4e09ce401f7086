//! Dataset orchestration for seedgraph.
//!
//! Three pipelines share one set of building blocks:
//!
//! - [`golden`]: seeds -> co-occurrence graph -> sampled combinations ->
//!   question/answer pairs, one graph per domain.
//! - [`expansion`]: each seed expanded into related questions, answered by
//!   the configured answer sources.
//! - [`documents`]: question/answer pairs grounded in local text files.
//!
//! External services come in as trait objects ([`ElementExtractor`],
//! [`TextGenerator`], [`AnswerSource`]); nothing here holds global state.
//!
//! [`ElementExtractor`]: seedgraph_extract::ElementExtractor
//! [`TextGenerator`]: seedgraph_llm::TextGenerator
//! [`AnswerSource`]: seedgraph_llm::AnswerSource

pub mod config;
pub mod documents;
pub mod error;
pub mod expansion;
pub mod golden;
pub mod seeds;
pub mod table;

pub use config::{RunConfig, DEFAULT_DOMAIN, DEFAULT_OUTPUT_DIR};
pub use documents::{
    chunk_document, document_qa_table, is_text_file, load_documents, Chunk, ChunkOptions,
    Document, DocumentQaGenerator, DocumentQaPair, GOLDEN_QA_FILE,
};
pub use error::{DatasetError, Result};
pub use expansion::{
    render_text_report, results_table, OutputFormat, QueryExpander, QueryResult,
    QUERY_RESULTS_FILE,
};
pub use golden::{
    dataset_table, describe_combination, domain_file_stem, generate_domain_dataset,
    DomainReport, GeneratedQuestion, GeneratorState, GoldenDatasetGenerator,
};
pub use seeds::{SeedQuery, SeedSet};
pub use table::Table;
