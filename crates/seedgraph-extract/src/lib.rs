//! Element extraction for seed queries.
//!
//! An [`ElementExtractor`] turns one natural-language query into an
//! [`ElementSet`]. Backends:
//! - [`CommandExtractor`]: an external NLP program (for example a spaCy
//!   script) speaking `seedgraph_extract_v1` over stdin/stdout JSON
//! - [`HeuristicExtractor`]: offline regex and stop-word rules
//! - [`StaticExtractor`]: canned results, for tests and replaying fixtures

pub mod heuristic;
pub mod plugin;

pub use heuristic::HeuristicExtractor;
pub use plugin::{run_json_plugin, wait_with_output_timeout, PluginError};

use seedgraph_graph::ElementSet;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const EXTRACT_PROTOCOL_V1: &str = "seedgraph_extract_v1";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("extractor `{extractor}` reported an error: {message}")]
    Reported { extractor: String, message: String },
    #[error("extractor `{extractor}` returned malformed elements: {message}")]
    Malformed { extractor: String, message: String },
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Pulls typed elements out of a query.
pub trait ElementExtractor {
    fn name(&self) -> &str;

    fn extract(&self, text: &str) -> Result<ElementSet, ExtractError>;
}

impl<T: ElementExtractor + ?Sized> ElementExtractor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, text: &str) -> Result<ElementSet, ExtractError> {
        (**self).extract(text)
    }
}

// ============================================================================
// Command plugin
// ============================================================================

#[derive(Debug, Serialize)]
struct ExtractRequestV1<'a> {
    protocol: &'static str,
    text: &'a str,
}

/// External extractor speaking `seedgraph_extract_v1`.
///
/// Request: `{"protocol": "seedgraph_extract_v1", "text": "..."}`.
/// Reply: an element set object, or `{"error": "..."}`.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
    name: String,
}

impl CommandExtractor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = format!("command:{}", program.display());
        Self {
            program,
            args,
            timeout: None,
            name,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ElementExtractor for CommandExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, text: &str) -> Result<ElementSet, ExtractError> {
        let request = ExtractRequestV1 {
            protocol: EXTRACT_PROTOCOL_V1,
            text,
        };
        let reply: serde_json::Value =
            run_json_plugin(&self.program, &self.args, &request, self.timeout)?;

        if let Some(message) = reply.get("error").and_then(|v| v.as_str()) {
            return Err(ExtractError::Reported {
                extractor: self.name.clone(),
                message: message.to_string(),
            });
        }

        let elements: ElementSet =
            serde_json::from_value(reply).map_err(|e| ExtractError::Malformed {
                extractor: self.name.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(extractor = %self.name, elements = elements.len(), "extracted elements");
        Ok(elements)
    }
}

// ============================================================================
// Static fixtures
// ============================================================================

/// Returns canned element sets keyed by exact query text. Unknown queries
/// yield an empty set with the built-in types present.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    fixtures: HashMap<String, ElementSet>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: impl Into<String>, elements: ElementSet) -> Self {
        self.fixtures.insert(text.into(), elements);
        self
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl ElementExtractor for StaticExtractor {
    fn name(&self) -> &str {
        "static"
    }

    fn extract(&self, text: &str) -> Result<ElementSet, ExtractError> {
        Ok(self
            .fixtures
            .get(text)
            .cloned()
            .unwrap_or_else(ElementSet::with_builtin_types))
    }
}
