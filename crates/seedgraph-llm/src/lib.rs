//! Text generation for seedgraph.
//!
//! Everything that talks to a language model goes through [`TextGenerator`]:
//! the configured [`LlmClient`] (mock, external command, Ollama, OpenAI,
//! Anthropic or Gemini), and the offline [`MockGenerator`] /
//! [`ScriptedGenerator`]. Prompt templates live in [`prompts`]; the lenient
//! response parsers in [`parse`]; answer fan-out in [`answers`].

pub mod answers;
pub mod backend;
pub mod error;
#[cfg(any(
    feature = "llm-ollama",
    feature = "llm-openai",
    feature = "llm-anthropic",
    feature = "llm-gemini"
))]
mod http;
pub mod mock;
pub mod parse;
pub mod prompts;
pub mod settings;

pub use answers::{
    AnswerGenerator, AnswerSelection, AnswerSource, AnswerSourceKind, GroundedAnswerer,
    LlmAnswerer, ANSWER_ERROR_PREFIX,
};
pub use backend::{LlmBackend, LlmClient, LLM_PROTOCOL_V1};
pub use error::LlmError;
#[cfg(feature = "llm-gemini")]
pub use http::GeminiEndpoint;
pub use mock::{MockGenerator, ScriptedGenerator};
pub use parse::{
    parse_json_array, parse_question_answer, parse_questions, QaPair, MISSING_ANSWER,
    MISSING_QUESTION,
};
pub use prompts::{answer_prompt, combination_prompt, document_qa_prompt, question_prompt};
pub use settings::{llm_timeout, LlmSettings};

/// Prompt in, raw completion text out.
pub trait TextGenerator {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}
