use crate::error::{AgentError, Result};
use crate::tokens::{self, DEFAULT_RECIPIENT};
use alloy_primitives::Address;
use std::env;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    pub recipient: Address,
    pub max_tool_rounds: usize,
}

impl Config {
    /// 加载 `.env`（如果存在），然后读取进程环境变量
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = var("GEMINI_API_KEY").ok_or(AgentError::MissingApiKey)?;

        let backend_url = var("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        backend_url
            .parse::<url::Url>()
            .map_err(|e| AgentError::Config(format!("Invalid BACKEND_URL: {}", e)))?;

        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_api_url =
            var("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());

        let recipient = match var("DEX_RECIPIENT_ADDRESS") {
            Some(raw) => tokens::parse_address(&raw).map_err(|_| {
                AgentError::Config(format!("Invalid DEX_RECIPIENT_ADDRESS: {}", raw))
            })?,
            None => DEFAULT_RECIPIENT,
        };

        let max_tool_rounds = match var("AGENT_MAX_TOOL_ROUNDS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AgentError::Config(format!("Invalid AGENT_MAX_TOOL_ROUNDS: {}", raw))
                })?,
            None => DEFAULT_MAX_TOOL_ROUNDS,
        };

        Ok(Config {
            backend_url,
            gemini_api_key,
            gemini_model,
            gemini_api_url,
            recipient,
            max_tool_rounds,
        })
    }

    pub fn new(gemini_api_key: String) -> Self {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            gemini_api_key,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            recipient: DEFAULT_RECIPIENT,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}
