use seedgraph_extract::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM backend is disabled (select one with --llm)")]
    Disabled,
    #[error("no model selected for the {backend} backend (pass --model or set {env})")]
    MissingModel {
        backend: &'static str,
        env: &'static str,
    },
    #[error("{backend} backend requires {env}")]
    MissingCredential {
        backend: &'static str,
        env: &'static str,
    },
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("parsing error: {0}")]
    ParseError(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("generator reported an error: {0}")]
    Reported(String),
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
