pub mod history;
pub mod prompt;
pub mod toolbox;

pub use history::{ChatHistory, Exchange};
pub use toolbox::Toolbox;

use alloy_primitives::Address;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::llm::{ChatModel, Content, GenerateContentRequest, Part, Tool};
use crate::tokens::TokenRegistry;

/// 一轮对话的进度事件，实时输出到终端
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Text(String),
    ToolCall { name: String, arguments: Value },
    ToolResult { name: String, output: String },
    TurnComplete,
}

pub struct DexAgent {
    model: Arc<dyn ChatModel>,
    toolbox: Toolbox,
    history: ChatHistory,
    system_instruction: Content,
    max_tool_rounds: usize,
}

impl DexAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        toolbox: Toolbox,
        user_address: Address,
        max_tool_rounds: usize,
    ) -> Self {
        let instruction = prompt::system_instruction(&TokenRegistry::new(), user_address);

        DexAgent {
            model,
            toolbox,
            history: ChatHistory::default(),
            system_instruction: Content::system(instruction),
            max_tool_rounds,
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    fn request(&self, turns: &[Content]) -> GenerateContentRequest {
        let mut contents = self.history.contents();
        contents.extend_from_slice(turns);

        GenerateContentRequest {
            system_instruction: Some(self.system_instruction.clone()),
            contents,
            tools: vec![Tool {
                function_declarations: self.toolbox.definitions(),
            }],
        }
    }

    /// 回答一条用户消息，并按模型的请求调用工具
    ///
    /// 只有模型给出最终回答时，本轮对话才会写入历史
    pub async fn respond(
        &mut self,
        user_text: &str,
        events: &UnboundedSender<AgentEvent>,
    ) -> Result<String> {
        let mut turns = vec![Content::user_text(user_text)];
        let on_text = |delta: &str| {
            let _ = events.send(AgentEvent::Text(delta.to_string()));
        };

        for round in 1..=self.max_tool_rounds {
            debug!("Model round {} ({} turns)", round, turns.len());

            let request = self.request(&turns);
            let reply = self.model.generate(&request, &on_text).await?;
            let calls: Vec<_> = reply.function_calls().cloned().collect();
            turns.push(reply);

            if calls.is_empty() {
                let answer = turns.last().map(Content::text).unwrap_or_default();
                self.history.push(Exchange { turns });
                let _ = events.send(AgentEvent::TurnComplete);
                return Ok(answer);
            }

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                info!("Tool call: {}", call.name);
                let _ = events.send(AgentEvent::ToolCall {
                    name: call.name.clone(),
                    arguments: call.args.clone(),
                });

                let output = self.toolbox.dispatch(&call.name, &call.args).await;

                let _ = events.send(AgentEvent::ToolResult {
                    name: call.name.clone(),
                    output: output.clone(),
                });
                responses.push(Part::function_response(
                    call.name,
                    json!({ "content": output }),
                ));
            }
            turns.push(Content::function_responses(responses));
        }

        warn!(
            "Giving up after {} model rounds without a final answer",
            self.max_tool_rounds
        );
        Err(AgentError::ToolLoopExhausted(self.max_tool_rounds))
    }
}
