pub mod gemini;
pub mod types;

pub use gemini::GeminiClient;
pub use types::{
    Content, FunctionCall, FunctionDeclaration, GenerateContentRequest, GenerateContentResponse,
    Part, Tool,
};

use async_trait::async_trait;

use crate::error::Result;

/// 每次请求生成一个对话轮次的模型
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 生成下一个模型轮次
    ///
    /// 文本到达时通过 `on_text` 实时回调，返回值包含完整的轮次
    async fn generate(
        &self,
        request: &GenerateContentRequest,
        on_text: &(dyn for<'a> Fn(&'a str) + Send + Sync),
    ) -> Result<Content>;
}
