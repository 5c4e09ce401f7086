//! Backend settings resolved from the environment.
//!
//! Precedence for every value: explicit override (CLI flag) > env var >
//! built-in default. Blank env values count as unset.

use crate::LlmError;
use std::time::Duration;

pub const SEEDGRAPH_LLM_TIMEOUT_SECS_ENV: &str = "SEEDGRAPH_LLM_TIMEOUT_SECS";
pub const SEEDGRAPH_LLM_MAX_OUTPUT_TOKENS_ENV: &str = "SEEDGRAPH_LLM_MAX_OUTPUT_TOKENS";

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";

pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const ANTHROPIC_MODEL_ENV: &str = "ANTHROPIC_MODEL";
pub const ANTHROPIC_VERSION_ENV: &str = "ANTHROPIC_VERSION";

pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const GOOGLE_API_KEY_ALIAS_ENV: &str = "GAPIKEY";
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";
pub const GOOGLE_CLOUD_PROJECT_ALIAS_ENV: &str = "PROJECT";
pub const GOOGLE_ACCESS_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";
pub const GEMINI_BASE_URL_ENV: &str = "GEMINI_BASE_URL";
pub const LOCATION_ENV: &str = "LOCATION";
pub const LLM_MODEL_ENV: &str = "LLM";
pub const DATASTORE_ID_ENV: &str = "DATASTORE_ID";

pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LOCATION: &str = "us-central1";

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub max_output_tokens: u32,

    pub ollama_host: String,
    pub ollama_model: Option<String>,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: Option<String>,

    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_model: Option<String>,
    pub anthropic_version: String,

    pub google_api_key: Option<String>,
    pub google_project: Option<String>,
    pub google_access_token: Option<String>,
    pub gemini_base_url: String,
    pub location: String,
    pub google_model: Option<String>,
    pub datastore_id: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS)),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_model: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: None,
            anthropic_api_key: None,
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            anthropic_model: None,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            google_api_key: None,
            google_project: None,
            google_access_token: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            google_model: None,
            datastore_id: None,
        }
    }
}

impl LlmSettings {
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup` (env-var semantics).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let defaults = Self::default();
        Ok(Self {
            timeout: llm_timeout(None, get(SEEDGRAPH_LLM_TIMEOUT_SECS_ENV).as_deref())?,
            max_output_tokens: match get(SEEDGRAPH_LLM_MAX_OUTPUT_TOKENS_ENV) {
                Some(v) => v.parse::<u32>().map_err(|_| {
                    LlmError::Config(format!(
                        "invalid {SEEDGRAPH_LLM_MAX_OUTPUT_TOKENS_ENV}={v:?} (expected a positive integer)"
                    ))
                })?,
                None => defaults.max_output_tokens,
            },
            ollama_host: get_or(OLLAMA_HOST_ENV, DEFAULT_OLLAMA_HOST),
            ollama_model: get(OLLAMA_MODEL_ENV),
            openai_api_key: get(OPENAI_API_KEY_ENV),
            openai_base_url: get_or(OPENAI_BASE_URL_ENV, DEFAULT_OPENAI_BASE_URL),
            openai_model: get(OPENAI_MODEL_ENV),
            anthropic_api_key: get(ANTHROPIC_API_KEY_ENV),
            anthropic_base_url: get_or(ANTHROPIC_BASE_URL_ENV, DEFAULT_ANTHROPIC_BASE_URL),
            anthropic_model: get(ANTHROPIC_MODEL_ENV),
            anthropic_version: get_or(ANTHROPIC_VERSION_ENV, DEFAULT_ANTHROPIC_VERSION),
            google_api_key: get(GOOGLE_API_KEY_ENV).or_else(|| get(GOOGLE_API_KEY_ALIAS_ENV)),
            google_project: get(GOOGLE_CLOUD_PROJECT_ENV)
                .or_else(|| get(GOOGLE_CLOUD_PROJECT_ALIAS_ENV)),
            google_access_token: get(GOOGLE_ACCESS_TOKEN_ENV),
            gemini_base_url: get_or(GEMINI_BASE_URL_ENV, DEFAULT_GEMINI_BASE_URL),
            location: get_or(LOCATION_ENV, DEFAULT_LOCATION),
            google_model: get(LLM_MODEL_ENV),
            datastore_id: get(DATASTORE_ID_ENV),
        })
    }

    /// Apply a CLI timeout override (`0` disables the timeout).
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        self
    }

    /// Vertex AI Search datastore resource for grounded answers.
    pub fn datastore_path(&self) -> Option<String> {
        let project = self.google_project.as_deref()?;
        let id = self.datastore_id.as_deref()?;
        Some(format!(
            "projects/{project}/locations/global/collections/default_collection/dataStores/{id}"
        ))
    }

    pub fn vertex_base_url(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com", self.location)
    }
}

/// Resolve the effective timeout.
///
/// Precedence:
/// 1) explicit override (`timeout_secs_override`)
/// 2) `SEEDGRAPH_LLM_TIMEOUT_SECS` (passed in as `env_value`)
/// 3) `DEFAULT_LLM_TIMEOUT_SECS`
///
/// `0` disables the timeout.
pub fn llm_timeout(
    timeout_secs_override: Option<u64>,
    env_value: Option<&str>,
) -> Result<Option<Duration>, LlmError> {
    let secs = match (timeout_secs_override, env_value.map(str::trim)) {
        (Some(v), _) => v,
        (None, Some(v)) if !v.is_empty() => v.parse::<u64>().map_err(|_| {
            LlmError::Config(format!(
                "invalid {SEEDGRAPH_LLM_TIMEOUT_SECS_ENV}={v:?} (expected integer seconds; 0 disables)"
            ))
        })?,
        _ => DEFAULT_LLM_TIMEOUT_SECS,
    };
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
