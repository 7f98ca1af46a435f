use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing GEMINI_API_KEY environment variable")]
    MissingApiKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    #[error("Stream failed: {0}")]
    StreamFailed(String),

    #[error("Rate limited - too many requests")]
    RateLimited,

    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Model kept calling tools after {0} rounds without answering")]
    ToolLoopExhausted(usize),
}

pub type Result<T> = std::result::Result<T, AgentError>;
