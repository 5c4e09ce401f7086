//! Blocking HTTP calls to hosted and local model APIs.
//!
//! One function per provider. Each builds a `reqwest::blocking::Client` with
//! the configured timeout, sends a single non-streaming request and extracts
//! the response text. HTTP 429 maps to [`LlmError::RateLimited`]; other
//! non-success statuses map to [`LlmError::Api`].

use crate::LlmError;
use serde_json::{json, Value};
use std::time::Duration;

fn build_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, LlmError> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| LlmError::Network(format!("failed to build http client: {e}")))
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.as_u16() == 429 {
        let retry_after_ms = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000)
            .unwrap_or(0);
        return Err(LlmError::RateLimited { retry_after_ms });
    }
    Err(LlmError::Api {
        status: status.as_u16(),
        body: resp.text().unwrap_or_default(),
    })
}

fn read_json(resp: reqwest::blocking::Response, provider: &str) -> Result<Value, LlmError> {
    resp.json()
        .map_err(|e| LlmError::InvalidResponse(format!("{provider} returned invalid JSON: {e}")))
}

pub(crate) fn normalize_http_base_url(base_url: &str, default: &str, scheme: &str) -> String {
    let mut host = base_url.trim().to_string();
    if host.is_empty() {
        host = default.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("{scheme}://{host}");
    }
    host.trim_end_matches('/').to_string()
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// Ollama (native /api/chat)
// =============================================================================

#[cfg(feature = "llm-ollama")]
pub(crate) fn ollama_chat(
    host: &str,
    model: &str,
    prompt: &str,
    timeout: Option<Duration>,
) -> Result<String, LlmError> {
    let host = normalize_http_base_url(host, crate::settings::DEFAULT_OLLAMA_HOST, "http");
    let url = format!("{host}/api/chat");
    let body = json!({
        "model": model,
        "stream": false,
        "messages": [{ "role": "user", "content": prompt }],
        "options": { "temperature": 0 }
    });

    let client = build_client(timeout)?;
    let resp = client.post(&url).json(&body).send().map_err(|e| {
        LlmError::Network(format!(
            "failed to reach ollama at {url} (is it running?) ({e}). Try: `ollama serve` or set OLLAMA_HOST"
        ))
    })?;
    let v = read_json(check_status(resp)?, "ollama")?;
    v.pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("ollama: missing message.content".to_string()))
}

// =============================================================================
// OpenAI (Responses API)
// =============================================================================

#[cfg(feature = "llm-openai")]
pub(crate) fn openai_extract_output_text(v: &Value) -> Option<String> {
    let mut out = String::new();
    for item in v.get("output")?.as_array()? {
        // Only "message" items carry user-visible text.
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let Some(content) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for c in content {
            if c.get("type").and_then(Value::as_str) != Some("output_text") {
                continue;
            }
            if let Some(t) = c.get("text").and_then(Value::as_str) {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(t);
            }
        }
    }
    non_empty(out)
}

#[cfg(feature = "llm-openai")]
pub(crate) fn openai_responses(
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    max_output_tokens: u32,
    timeout: Option<Duration>,
) -> Result<String, LlmError> {
    let base_url =
        normalize_http_base_url(base_url, crate::settings::DEFAULT_OPENAI_BASE_URL, "https");
    let url = format!("{base_url}/v1/responses");
    let body = json!({
        "model": model,
        "input": prompt,
        "max_output_tokens": max_output_tokens
    });

    let client = build_client(timeout)?;
    let resp = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .map_err(|e| LlmError::Network(format!("failed to reach OpenAI at {url}: {e}")))?;
    let v = read_json(check_status(resp)?, "openai")?;
    openai_extract_output_text(&v).ok_or_else(|| {
        LlmError::InvalidResponse("openai: no output_text in response".to_string())
    })
}

// =============================================================================
// Anthropic (Messages API)
// =============================================================================

#[cfg(feature = "llm-anthropic")]
pub(crate) fn anthropic_extract_output_text(v: &Value) -> Option<String> {
    let mut out = String::new();
    for block in v.get("content")?.as_array()? {
        if block.get("type").and_then(Value::as_str) != Some("text") {
            continue;
        }
        if let Some(t) = block.get("text").and_then(Value::as_str) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(t);
        }
    }
    non_empty(out)
}

#[cfg(feature = "llm-anthropic")]
pub(crate) fn anthropic_messages(
    base_url: &str,
    api_key: &str,
    version: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
    timeout: Option<Duration>,
) -> Result<String, LlmError> {
    let base_url =
        normalize_http_base_url(base_url, crate::settings::DEFAULT_ANTHROPIC_BASE_URL, "https");
    let url = format!("{base_url}/v1/messages");
    let body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "temperature": 0,
        "messages": [{ "role": "user", "content": prompt }]
    });

    let client = build_client(timeout)?;
    let resp = client
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", version)
        .json(&body)
        .send()
        .map_err(|e| LlmError::Network(format!("failed to reach Anthropic at {url}: {e}")))?;
    let v = read_json(check_status(resp)?, "anthropic")?;
    anthropic_extract_output_text(&v).ok_or_else(|| {
        LlmError::InvalidResponse("anthropic: no text blocks in response".to_string())
    })
}

// =============================================================================
// Gemini (Gemini API or Vertex AI generateContent)
// =============================================================================

/// Where a Gemini request goes and how it authenticates.
#[cfg(feature = "llm-gemini")]
#[derive(Debug, Clone, PartialEq)]
pub enum GeminiEndpoint {
    /// `generativelanguage.googleapis.com`, API key auth.
    Developer { base_url: String, api_key: String },
    /// Vertex AI, OAuth bearer token auth.
    Vertex {
        base_url: String,
        project: String,
        location: String,
        access_token: String,
    },
}

#[cfg(feature = "llm-gemini")]
impl GeminiEndpoint {
    /// Prefer an API key; fall back to Vertex AI with a project and token.
    pub fn from_settings(settings: &crate::LlmSettings) -> Result<Self, LlmError> {
        if let Some(api_key) = &settings.google_api_key {
            return Ok(Self::Developer {
                base_url: settings.gemini_base_url.clone(),
                api_key: api_key.clone(),
            });
        }
        match (&settings.google_project, &settings.google_access_token) {
            (Some(project), Some(token)) => Ok(Self::Vertex {
                base_url: settings.vertex_base_url(),
                project: project.clone(),
                location: settings.location.clone(),
                access_token: token.clone(),
            }),
            _ => Err(LlmError::MissingCredential {
                backend: "gemini",
                env: "GOOGLE_API_KEY (or GOOGLE_CLOUD_PROJECT + GOOGLE_ACCESS_TOKEN)",
            }),
        }
    }

    fn url(&self, model: &str) -> String {
        match self {
            Self::Developer { base_url, .. } => {
                let base = normalize_http_base_url(
                    base_url,
                    crate::settings::DEFAULT_GEMINI_BASE_URL,
                    "https",
                );
                format!("{base}/v1beta/models/{model}:generateContent")
            }
            Self::Vertex {
                base_url,
                project,
                location,
                ..
            } => {
                let base = normalize_http_base_url(base_url, base_url, "https");
                format!(
                    "{base}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
                )
            }
        }
    }
}

#[cfg(feature = "llm-gemini")]
pub(crate) fn gemini_extract_text(v: &Value) -> Option<String> {
    let parts = v.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    non_empty(text.join(""))
}

/// `tools` is passed through verbatim, e.g. `[{"google_search": {}}]`.
#[cfg(feature = "llm-gemini")]
pub(crate) fn gemini_generate(
    endpoint: &GeminiEndpoint,
    model: &str,
    prompt: &str,
    tools: Option<Value>,
    max_output_tokens: u32,
    timeout: Option<Duration>,
) -> Result<String, LlmError> {
    let url = endpoint.url(model);
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": { "temperature": 0, "maxOutputTokens": max_output_tokens }
    });
    if let Some(tools) = tools {
        body["tools"] = tools;
    }

    let client = build_client(timeout)?;
    let request = client.post(&url).json(&body);
    let request = match endpoint {
        GeminiEndpoint::Developer { api_key, .. } => request.header("x-goog-api-key", api_key),
        GeminiEndpoint::Vertex { access_token, .. } => request.bearer_auth(access_token),
    };
    let resp = request
        .send()
        .map_err(|e| LlmError::Network(format!("failed to reach Gemini at {url}: {e}")))?;
    let v = read_json(check_status(resp)?, "gemini")?;
    gemini_extract_text(&v)
        .ok_or_else(|| LlmError::InvalidResponse("gemini: no text parts in response".to_string()))
}
