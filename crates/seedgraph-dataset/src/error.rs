use seedgraph_extract::ExtractError;
use seedgraph_llm::LlmError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("cannot {action} while the generator is {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("generation failed: {0}")]
    Llm(#[from] LlmError),
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid seed file {}: {message}", .path.display())]
    Seeds { path: PathBuf, message: String },
    #[error("invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
