//! Backend selection and the [`LlmClient`] that dispatches to it.

use crate::mock::MockGenerator;
use crate::settings::LlmSettings;
use crate::{LlmError, TextGenerator};
use seedgraph_extract::run_json_plugin;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LLM_PROTOCOL_V1: &str = "seedgraph_llm_v1";

const HOSTED_BACKENDS: &[&str] = &["ollama", "openai", "anthropic", "gemini"];

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LlmBackend {
    #[default]
    Disabled,
    /// Deterministic offline generator (see [`MockGenerator`]).
    Mock,
    /// External program speaking `seedgraph_llm_v1` over stdin/stdout JSON.
    Command { program: PathBuf, args: Vec<String> },
    /// Local Ollama server (`/api/chat`).
    #[cfg(feature = "llm-ollama")]
    Ollama { host: String },
    /// OpenAI Responses API. Needs `OPENAI_API_KEY`.
    #[cfg(feature = "llm-openai")]
    OpenAI { base_url: String },
    /// Anthropic Messages API. Needs `ANTHROPIC_API_KEY`.
    #[cfg(feature = "llm-anthropic")]
    Anthropic { base_url: String },
    /// Gemini API (API key) or Vertex AI (project + access token).
    #[cfg(feature = "llm-gemini")]
    Gemini,
}

impl LlmBackend {
    /// Parse a backend name. `command` needs a program and is built directly.
    pub fn from_name(name: &str, settings: &LlmSettings) -> Result<Self, LlmError> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "mock" => Ok(Self::Mock),
            #[cfg(feature = "llm-ollama")]
            "ollama" => Ok(Self::Ollama {
                host: settings.ollama_host.clone(),
            }),
            #[cfg(feature = "llm-openai")]
            "openai" => Ok(Self::OpenAI {
                base_url: settings.openai_base_url.clone(),
            }),
            #[cfg(feature = "llm-anthropic")]
            "anthropic" => Ok(Self::Anthropic {
                base_url: settings.anthropic_base_url.clone(),
            }),
            #[cfg(feature = "llm-gemini")]
            "gemini" | "vertex" => Ok(Self::Gemini),
            "command" => Err(LlmError::Config(
                "the command backend needs a program (use --llm-command)".to_string(),
            )),
            other if HOSTED_BACKENDS.contains(&other) => Err(LlmError::Config(format!(
                "backend `{other}` is not compiled in (enable the llm-{other} feature)"
            ))),
            other => Err(LlmError::Config(format!(
                "unknown LLM backend `{other}` (expected mock|command|ollama|openai|anthropic|gemini|disabled)"
            ))),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Disabled => "disabled".to_string(),
            Self::Mock => "mock".to_string(),
            Self::Command { program, .. } => format!("command({})", program.display()),
            #[cfg(feature = "llm-ollama")]
            Self::Ollama { host } => format!("ollama({host})"),
            #[cfg(feature = "llm-openai")]
            Self::OpenAI { base_url } => format!("openai({base_url})"),
            #[cfg(feature = "llm-anthropic")]
            Self::Anthropic { base_url } => format!("anthropic({base_url})"),
            #[cfg(feature = "llm-gemini")]
            Self::Gemini => "gemini".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LlmRequestV1<'a> {
    protocol: &'static str,
    model: Option<&'a str>,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct LlmReplyV1 {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A configured backend plus model choice.
#[derive(Debug, Clone, Default)]
pub struct LlmClient {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub settings: LlmSettings,
}

impl LlmClient {
    pub fn new(backend: LlmBackend, model: Option<String>, settings: LlmSettings) -> Self {
        Self {
            backend,
            model,
            settings,
        }
    }

    pub fn mock() -> Self {
        Self::new(LlmBackend::Mock, None, LlmSettings::default())
    }

    /// Explicit model, else the backend's env default.
    pub fn effective_model(&self) -> Option<&str> {
        if let Some(model) = self.model.as_deref() {
            return Some(model);
        }
        match &self.backend {
            #[cfg(feature = "llm-ollama")]
            LlmBackend::Ollama { .. } => self.settings.ollama_model.as_deref(),
            #[cfg(feature = "llm-openai")]
            LlmBackend::OpenAI { .. } => self.settings.openai_model.as_deref(),
            #[cfg(feature = "llm-anthropic")]
            LlmBackend::Anthropic { .. } => self.settings.anthropic_model.as_deref(),
            #[cfg(feature = "llm-gemini")]
            LlmBackend::Gemini => self.settings.google_model.as_deref(),
            _ => None,
        }
    }

    pub fn status_line(&self) -> String {
        let model = self.effective_model().unwrap_or("(none)");
        let timeout = match self.settings.timeout {
            Some(t) => format!("{}s", t.as_secs()),
            None => "none".to_string(),
        };
        format!(
            "llm: backend={} model={model} timeout={timeout}",
            self.backend.label()
        )
    }

    #[allow(dead_code)]
    fn require_model(&self, backend: &'static str, env: &'static str) -> Result<&str, LlmError> {
        self.effective_model()
            .ok_or(LlmError::MissingModel { backend, env })
    }

    fn run_command(
        &self,
        program: &Path,
        args: &[String],
        prompt: &str,
    ) -> Result<String, LlmError> {
        let request = LlmRequestV1 {
            protocol: LLM_PROTOCOL_V1,
            model: self.effective_model(),
            prompt,
        };
        let reply: LlmReplyV1 = run_json_plugin(program, args, &request, self.settings.timeout)?;
        if let Some(err) = reply.error {
            return Err(LlmError::Reported(err));
        }
        reply.text.ok_or_else(|| {
            LlmError::InvalidResponse(format!(
                "llm plugin `{}` returned neither `text` nor `error`",
                program.display()
            ))
        })
    }
}

impl TextGenerator for LlmClient {
    fn name(&self) -> &str {
        match &self.backend {
            LlmBackend::Disabled => "disabled",
            LlmBackend::Mock => "mock",
            LlmBackend::Command { .. } => "command",
            #[cfg(feature = "llm-ollama")]
            LlmBackend::Ollama { .. } => "ollama",
            #[cfg(feature = "llm-openai")]
            LlmBackend::OpenAI { .. } => "openai",
            #[cfg(feature = "llm-anthropic")]
            LlmBackend::Anthropic { .. } => "anthropic",
            #[cfg(feature = "llm-gemini")]
            LlmBackend::Gemini => "gemini",
        }
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(backend = self.name(), prompt_chars = prompt.len(), "llm request");
        match &self.backend {
            LlmBackend::Disabled => Err(LlmError::Disabled),
            LlmBackend::Mock => MockGenerator.generate(prompt),
            LlmBackend::Command { program, args } => self.run_command(program, args, prompt),
            #[cfg(feature = "llm-ollama")]
            LlmBackend::Ollama { host } => {
                let model = self.require_model("ollama", crate::settings::OLLAMA_MODEL_ENV)?;
                let s = &self.settings;
                crate::http::ollama_chat(host, model, prompt, s.timeout)
            }
            #[cfg(feature = "llm-openai")]
            LlmBackend::OpenAI { base_url } => {
                let model = self.require_model("openai", crate::settings::OPENAI_MODEL_ENV)?;
                let s = &self.settings;
                let key = s.openai_api_key.as_deref().ok_or(LlmError::MissingCredential {
                    backend: "openai",
                    env: crate::settings::OPENAI_API_KEY_ENV,
                })?;
                crate::http::openai_responses(
                    base_url,
                    key,
                    model,
                    prompt,
                    s.max_output_tokens,
                    s.timeout,
                )
            }
            #[cfg(feature = "llm-anthropic")]
            LlmBackend::Anthropic { base_url } => {
                let model = self.require_model("anthropic", crate::settings::ANTHROPIC_MODEL_ENV)?;
                let s = &self.settings;
                let key = s
                    .anthropic_api_key
                    .as_deref()
                    .ok_or(LlmError::MissingCredential {
                        backend: "anthropic",
                        env: crate::settings::ANTHROPIC_API_KEY_ENV,
                    })?;
                crate::http::anthropic_messages(
                    base_url,
                    key,
                    &s.anthropic_version,
                    model,
                    prompt,
                    s.max_output_tokens,
                    s.timeout,
                )
            }
            #[cfg(feature = "llm-gemini")]
            LlmBackend::Gemini => {
                let model = self.require_model("gemini", crate::settings::LLM_MODEL_ENV)?;
                let s = &self.settings;
                let endpoint = crate::http::GeminiEndpoint::from_settings(s)?;
                crate::http::gemini_generate(
                    &endpoint,
                    model,
                    prompt,
                    None,
                    s.max_output_tokens,
                    s.timeout,
                )
            }
        }
    }
}
