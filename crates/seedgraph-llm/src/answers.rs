//! Answer sources: plain LLM, datastore-grounded and search-grounded.

use crate::prompts::answer_prompt;
use crate::settings::LlmSettings;
use crate::{LlmError, TextGenerator};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of the per-question error string stored in place of an answer.
pub const ANSWER_ERROR_PREFIX: &str = "Error generating answer: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnswerSourceKind {
    Llm,
    Datastore,
    Google,
}

impl AnswerSourceKind {
    pub const ALL: [AnswerSourceKind; 3] = [Self::Llm, Self::Datastore, Self::Google];

    /// Unknown names fall back to `llm`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "llm" => Self::Llm,
            "datastore" => Self::Datastore,
            "google" | "search" => Self::Google,
            other => {
                tracing::warn!(source = other, "unknown answer source, using llm");
                Self::Llm
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Datastore => "datastore",
            Self::Google => "google",
        }
    }

    /// Table column holding this source's answers.
    pub fn column_name(&self) -> String {
        format!("{}_answer", self.as_str())
    }
}

impl fmt::Display for AnswerSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sources a run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerSelection {
    #[default]
    None,
    One(AnswerSourceKind),
    All,
}

impl AnswerSelection {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Self::None,
            "all" => Self::All,
            other => Self::One(AnswerSourceKind::parse(other)),
        }
    }

    pub fn sources(&self) -> Vec<AnswerSourceKind> {
        match self {
            Self::None => Vec::new(),
            Self::One(kind) => vec![*kind],
            Self::All => AnswerSourceKind::ALL.to_vec(),
        }
    }
}

impl fmt::Display for AnswerSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::One(kind) => write!(f, "{kind}"),
            Self::All => f.write_str("all"),
        }
    }
}

pub trait AnswerSource {
    fn kind(&self) -> AnswerSourceKind;
    fn answer(&self, question: &str) -> Result<String, LlmError>;
}

// ============================================================================
// Sources
// ============================================================================

/// Asks the generator directly.
pub struct LlmAnswerer<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> LlmAnswerer<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }
}

impl AnswerSource for LlmAnswerer<'_> {
    fn kind(&self) -> AnswerSourceKind {
        AnswerSourceKind::Llm
    }

    fn answer(&self, question: &str) -> Result<String, LlmError> {
        self.generator.generate(&answer_prompt(question))
    }
}

/// Gemini with a grounding tool: Vertex AI Search (`datastore`) or Google
/// Search (`google`).
#[derive(Debug, Clone)]
pub struct GroundedAnswerer {
    kind: AnswerSourceKind,
    settings: LlmSettings,
    model: Option<String>,
}

impl GroundedAnswerer {
    pub fn datastore(settings: LlmSettings, model: Option<String>) -> Self {
        Self {
            kind: AnswerSourceKind::Datastore,
            settings,
            model,
        }
    }

    pub fn google(settings: LlmSettings, model: Option<String>) -> Self {
        Self {
            kind: AnswerSourceKind::Google,
            settings,
            model,
        }
    }

    #[cfg_attr(not(feature = "llm-gemini"), allow(dead_code))]
    fn model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or(self.settings.google_model.as_deref())
    }

    /// The `tools` value for the request.
    pub fn tools(&self) -> Result<serde_json::Value, LlmError> {
        match self.kind {
            AnswerSourceKind::Datastore => {
                let datastore = self.settings.datastore_path().ok_or_else(|| {
                    LlmError::NotConfigured(
                        "datastore answers (set GOOGLE_CLOUD_PROJECT and DATASTORE_ID)".to_string(),
                    )
                })?;
                Ok(serde_json::json!([
                    { "retrieval": { "vertexAiSearch": { "datastore": datastore } } }
                ]))
            }
            _ => Ok(serde_json::json!([{ "google_search": {} }])),
        }
    }
}

impl AnswerSource for GroundedAnswerer {
    fn kind(&self) -> AnswerSourceKind {
        self.kind
    }

    #[cfg(feature = "llm-gemini")]
    fn answer(&self, question: &str) -> Result<String, LlmError> {
        let tools = self.tools()?;
        let model = self.model().ok_or(LlmError::MissingModel {
            backend: "gemini",
            env: crate::settings::LLM_MODEL_ENV,
        })?;
        let endpoint = crate::http::GeminiEndpoint::from_settings(&self.settings)?;
        crate::http::gemini_generate(
            &endpoint,
            model,
            &answer_prompt(question),
            Some(tools),
            self.settings.max_output_tokens,
            self.settings.timeout,
        )
    }

    #[cfg(not(feature = "llm-gemini"))]
    fn answer(&self, _question: &str) -> Result<String, LlmError> {
        self.tools()?;
        Err(LlmError::NotConfigured(format!(
            "{} answers (build with the llm-gemini feature)",
            self.kind
        )))
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Routes questions to registered sources and never fails as a whole: a
/// failed question gets `Error generating answer: <cause>` as its answer.
#[derive(Default)]
pub struct AnswerGenerator<'a> {
    sources: BTreeMap<AnswerSourceKind, Box<dyn AnswerSource + 'a>>,
}

impl<'a> AnswerGenerator<'a> {
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Register a source under its own kind, replacing any earlier one.
    pub fn with_source(mut self, source: impl AnswerSource + 'a) -> Self {
        self.sources.insert(source.kind(), Box::new(source));
        self
    }

    pub fn has_source(&self, kind: AnswerSourceKind) -> bool {
        self.sources.contains_key(&kind)
    }

    /// `(question, answer)` for every question, in input order.
    pub fn generate_answers(
        &self,
        questions: &[String],
        kind: AnswerSourceKind,
    ) -> Vec<(String, String)> {
        let source = self.sources.get(&kind);
        questions
            .iter()
            .map(|question| {
                let result = match source {
                    Some(source) => source.answer(question),
                    None => Err(LlmError::NotConfigured(format!("{kind} answer source"))),
                };
                let answer = match result {
                    Ok(answer) => answer.trim().to_string(),
                    Err(e) => {
                        tracing::warn!(source = %kind, %question, error = %e, "answer failed");
                        format!("{ANSWER_ERROR_PREFIX}{e}")
                    }
                };
                (question.clone(), answer)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockGenerator, ScriptedGenerator};

    #[test]
    fn source_names() {
        assert_eq!(AnswerSourceKind::parse("Datastore"), AnswerSourceKind::Datastore);
        assert_eq!(AnswerSourceKind::parse("search"), AnswerSourceKind::Google);
        assert_eq!(AnswerSourceKind::parse("bing"), AnswerSourceKind::Llm);
        assert_eq!(AnswerSourceKind::Google.column_name(), "google_answer");

        assert!(AnswerSelection::parse("none").sources().is_empty());
        assert_eq!(
            AnswerSelection::parse("all").sources(),
            vec![
                AnswerSourceKind::Llm,
                AnswerSourceKind::Datastore,
                AnswerSourceKind::Google
            ]
        );
        assert_eq!(
            AnswerSelection::parse("llm"),
            AnswerSelection::One(AnswerSourceKind::Llm)
        );
    }

    #[test]
    fn llm_answers_in_order() {
        let answers = AnswerGenerator::new()
            .with_source(LlmAnswerer::new(&MockGenerator))
            .generate_answers(&["A?".to_string(), "B?".to_string()], AnswerSourceKind::Llm);
        assert_eq!(
            answers,
            vec![
                ("A?".to_string(), "Mock answer: A?".to_string()),
                ("B?".to_string(), "Mock answer: B?".to_string()),
            ]
        );
    }

    #[test]
    fn failures_are_recorded_per_question() {
        let scripted = ScriptedGenerator::new().fail("quota exceeded").reply("  fine  ");
        let answers = AnswerGenerator::new()
            .with_source(LlmAnswerer::new(&scripted))
            .generate_answers(&["one".to_string(), "two".to_string()], AnswerSourceKind::Llm);

        assert!(answers[0].1.starts_with(ANSWER_ERROR_PREFIX));
        assert!(answers[0].1.contains("quota exceeded"));
        assert_eq!(answers[1].1, "fine");
    }

    #[test]
    fn unregistered_source_yields_error_strings() {
        let generator = AnswerGenerator::new();
        assert!(!generator.has_source(AnswerSourceKind::Google));
        let answers = generator.generate_answers(&["q".to_string()], AnswerSourceKind::Google);
        assert_eq!(answers.len(), 1);
        assert!(answers[0].1.starts_with(ANSWER_ERROR_PREFIX));
    }

    #[test]
    fn grounded_sources_need_configuration() {
        let datastore = GroundedAnswerer::datastore(LlmSettings::default(), None);
        assert!(matches!(datastore.tools(), Err(LlmError::NotConfigured(_))));
        assert!(datastore.answer("q").is_err());

        let settings = LlmSettings {
            google_project: Some("proj".to_string()),
            datastore_id: Some("ds1".to_string()),
            ..LlmSettings::default()
        };
        let tools = GroundedAnswerer::datastore(settings, None).tools().unwrap();
        assert_eq!(
            tools[0]["retrieval"]["vertexAiSearch"]["datastore"],
            "projects/proj/locations/global/collections/default_collection/dataStores/ds1"
        );

        let google = GroundedAnswerer::google(LlmSettings::default(), Some("gemini-x".into()));
        assert_eq!(google.tools().unwrap()[0]["google_search"], serde_json::json!({}));
        // No API key and no Vertex credentials.
        assert!(google.answer("q").is_err());
    }
}
