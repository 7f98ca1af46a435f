pub mod agent;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod llm;
pub mod precision;
pub mod tokens;
pub mod tools;

pub use agent::{AgentEvent, DexAgent, Toolbox};
pub use backend::BackendClient;
pub use config::Config;
pub use error::{AgentError, Result};
pub use llm::{ChatModel, GeminiClient};
