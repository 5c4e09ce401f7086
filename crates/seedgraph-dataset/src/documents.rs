//! Question/answer generation grounded in local documents.

use crate::config::RunConfig;
use crate::error::{DatasetError, Result};
use crate::table::Table;
use seedgraph_llm::{document_qa_prompt, parse_json_array, QaPair, TextGenerator};
use std::path::Path;
use walkdir::WalkDir;

pub const GOLDEN_QA_FILE: &str = "golden_qa_dataset.csv";

/// Extensions treated as text (lowercase, without dot).
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "csv", "py", "js", "html", "xml", "log", "yml", "yaml",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub source: String,
    pub doc_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub doc_id: String,
    /// Character offsets into the document.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub size: usize,
    pub overlap: usize,
    pub min_chars: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            size: 3000,
            overlap: 1000,
            min_chars: 200,
        }
    }
}

impl From<&RunConfig> for ChunkOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            size: config.chunk_size,
            overlap: config.chunk_overlap,
            min_chars: config.min_chunk_chars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQaPair {
    pub question: String,
    pub answer: String,
    pub source: String,
    pub doc_id: String,
}

pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Every text file under `root`, sorted by path. Unreadable files are logged
/// and skipped; `doc_id` is the path relative to `root`.
pub fn load_documents(root: &Path) -> Result<Vec<Document>> {
    if !root.is_dir() {
        return Err(DatasetError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut documents = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_text_file(path) {
            continue;
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "error loading document");
                continue;
            }
        };
        let doc_id = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        documents.push(Document {
            text,
            source: path.display().to_string(),
            doc_id,
        });
    }
    tracing::info!(root = %root.display(), documents = documents.len(), "loaded documents");
    Ok(documents)
}

/// Overlapping character windows of `options.size`, advancing by
/// `size - overlap`. Windows shorter than `min_chars` are dropped.
pub fn chunk_document(document: &Document, options: ChunkOptions) -> Vec<Chunk> {
    let chars: Vec<char> = document.text.chars().collect();
    let stride = options.size.saturating_sub(options.overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + options.size).min(chars.len());
        if end - start >= options.min_chars {
            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                source: document.source.clone(),
                doc_id: document.doc_id.clone(),
                start,
                end,
            });
        }
        start += stride;
    }
    chunks
}

pub struct DocumentQaGenerator<'a> {
    generator: &'a dyn TextGenerator,
    options: ChunkOptions,
}

impl<'a> DocumentQaGenerator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, options: ChunkOptions) -> Self {
        Self { generator, options }
    }

    /// Pairs for one chunk. Generation and parse failures are logged and
    /// yield no pairs.
    pub fn generate_qa_pairs(&self, chunk: &Chunk, num_questions: usize) -> Vec<DocumentQaPair> {
        let reply = match self
            .generator
            .generate(&document_qa_prompt(&chunk.text, num_questions))
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(source = %chunk.source, error = %e, "error generating QA pairs");
                return Vec::new();
            }
        };
        match parse_json_array::<QaPair>(&reply) {
            Ok(pairs) => pairs
                .into_iter()
                .map(|p| DocumentQaPair {
                    question: p.question,
                    answer: p.answer,
                    source: chunk.source.clone(),
                    doc_id: chunk.doc_id.clone(),
                })
                .collect(),
            Err(e) => {
                tracing::error!(source = %chunk.source, error = %e, "error parsing QA pairs");
                Vec::new()
            }
        }
    }

    /// Spread `total_questions` evenly over all chunks (at least one each).
    pub fn generate_dataset(
        &self,
        documents: &[Document],
        total_questions: usize,
    ) -> Vec<DocumentQaPair> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| chunk_document(doc, self.options))
            .collect();
        if chunks.is_empty() {
            tracing::warn!("no valid chunks found in documents");
            return Vec::new();
        }

        let per_chunk = (total_questions / chunks.len()).max(1);
        let mut dataset = Vec::new();
        for chunk in &chunks {
            let pairs = self.generate_qa_pairs(chunk, per_chunk);
            tracing::info!(source = %chunk.source, pairs = pairs.len(), "generated QA pairs from chunk");
            dataset.extend(pairs);
        }
        tracing::info!(pairs = dataset.len(), "created document QA dataset");
        dataset
    }
}

pub fn document_qa_table(pairs: &[DocumentQaPair]) -> Table {
    let mut table = Table::new(["question", "answer", "source", "doc_id"]);
    for pair in pairs {
        table.push_row(vec![
            pair.question.clone(),
            pair.answer.clone(),
            pair.source.clone(),
            pair.doc_id.clone(),
        ]);
    }
    table
}
