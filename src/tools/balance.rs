use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::tools::{ToolFailure, ToolResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub token_address: String,
    pub owner_address: String,
}

#[derive(Debug, Clone, Serialize)]
struct BalanceContext<'a> {
    token: &'a str,
    owner: &'a str,
}

pub struct BalanceTool {
    backend: BackendClient,
}

impl BalanceTool {
    pub fn new(backend: BackendClient) -> Self {
        BalanceTool { backend }
    }

    /// 获取 `owner_address` 持有的 ERC20 代币余额及代币详情
    ///
    /// 后端返回 `success` 不为 `true` 时，改写为带上下文 `{token, owner}` 的错误
    pub async fn get_token_balance(&self, request: &BalanceRequest) -> ToolResult<Value> {
        info!(
            "Fetching balance of {} for token {}",
            request.owner_address, request.token_address
        );

        let context = BalanceContext {
            token: &request.token_address,
            owner: &request.owner_address,
        };

        let path = format!("/token/balance/{}", request.owner_address);
        let body = self
            .backend
            .get(&path, &[("tokenAddress", request.token_address.as_str())])
            .await
            .map_err(|e| ToolFailure::new(e).with_context(&context))?;

        // 后端以 `success: false` 表示业务层失败
        if body.get("success").and_then(Value::as_bool) != Some(true) {
            warn!("Backend reported a balance lookup failure: {}", body);
            let error = body
                .get("error")
                .cloned()
                .unwrap_or_else(|| json!("Unknown error"));
            let details = body
                .get("details")
                .cloned()
                .unwrap_or_else(|| json!("No additional details available"));

            return Err(ToolFailure {
                error,
                details: Some(details),
                context: None,
            }
            .with_context(&context));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::render;
    use crate::tools::test_support::UNREACHABLE_BACKEND;
    use mockito::Matcher;

    const TOKEN: &str = "0xcde412ba5370eDEb27F3C549f8E9949D296045CF";
    const OWNER: &str = "0xeD24fb342c24607A42F722bCEBe7febE7B3AA2F4";

    fn request() -> BalanceRequest {
        BalanceRequest {
            token_address: TOKEN.to_string(),
            owner_address: OWNER.to_string(),
        }
    }

    #[tokio::test]
    async fn test_balance_passthrough() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/token/balance/{}", OWNER).as_str())
            .match_query(Matcher::UrlEncoded("tokenAddress".into(), TOKEN.into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "balance": "1000000000000000000"}"#)
            .create_async()
            .await;

        let tool = BalanceTool::new(BackendClient::new(server.url()).unwrap());
        let text = render(&tool.get_token_balance(&request()).await);

        assert_eq!(
            text,
            "{\n    \"success\": true,\n    \"balance\": \"1000000000000000000\"\n}"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_failure_rewrapped_with_context() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("/token/balance/{}", OWNER).as_str())
            .match_query(Matcher::Any)
            .with_body(r#"{"success": false, "error": "Invalid token"}"#)
            .create_async()
            .await;

        let tool = BalanceTool::new(BackendClient::new(server.url()).unwrap());
        let parsed: Value =
            serde_json::from_str(&render(&tool.get_token_balance(&request()).await)).unwrap();

        assert_eq!(
            parsed,
            json!({
                "error": "Invalid token",
                "details": "No additional details available",
                "context": {"token": TOKEN, "owner": OWNER}
            })
        );
    }

    #[tokio::test]
    async fn test_missing_success_flag_defaults_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("/token/balance/{}", OWNER).as_str())
            .match_query(Matcher::Any)
            .with_body(r#"{"balance": "5"}"#)
            .create_async()
            .await;

        let tool = BalanceTool::new(BackendClient::new(server.url()).unwrap());
        let failure = tool.get_token_balance(&request()).await.unwrap_err();

        assert_eq!(failure.error, json!("Unknown error"));
    }

    #[tokio::test]
    async fn test_connection_error_carries_context() {
        let tool = BalanceTool::new(BackendClient::new(UNREACHABLE_BACKEND.to_string()).unwrap());
        let parsed: Value =
            serde_json::from_str(&render(&tool.get_token_balance(&request()).await)).unwrap();

        assert!(parsed["error"].is_string());
        assert_eq!(parsed["context"], json!({"token": TOKEN, "owner": OWNER}));
        assert!(parsed.get("details").is_none());
    }
}
