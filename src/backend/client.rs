use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{AgentError, Result};

/// DEX 后端 REST API 的 HTTP 客户端
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// 创建以 `base_url` 为根的客户端（例如 `http://localhost:3000/api`）
    pub fn new(base_url: String) -> Result<Self> {
        base_url
            .parse::<url::Url>()
            .map_err(|_| AgentError::Config("Invalid backend URL format".to_string()))?;

        debug!("Using DEX backend: {}", base_url);

        Ok(BackendClient {
            inner: Arc::new(BackendClientInner {
                http: Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// 发送 GET 请求，可附带查询参数，并将响应体解析为 JSON
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint(path);
        debug!("GET {} {:?}", url, query);

        let mut request = self.inner.http.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(|e| {
            error!("Backend request failed: {}", e);
            AgentError::Network(e.to_string())
        })?;

        Self::decode(response).await
    }

    /// 发送 JSON 请求体的 POST 请求，并将响应体解析为 JSON
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .inner
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Backend request failed: {}", e);
                AgentError::Network(e.to_string())
            })?;

        Self::decode(response).await
    }

    async fn decode(response: Response) -> Result<Value> {
        let response = response.error_for_status().map_err(|e| {
            error!("Backend returned an error status: {}", e);
            AgentError::Network(e.to_string())
        })?;

        response.json::<Value>().await.map_err(|e| {
            error!("Backend returned a malformed body: {}", e);
            AgentError::InvalidResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_base_url() {
        assert!(BackendClient::new("localhost without scheme".to_string()).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:3000/api/".to_string()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.endpoint("/pool/all"), "http://localhost:3000/api/pool/all");
    }

    #[tokio::test]
    async fn test_get_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/items")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = BackendClient::new(server.url()).unwrap();
        let body = client.get("/items", &[("q", "1")]).await.unwrap();

        assert_eq!(body, json!({"ok": true}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/broken")
            .with_status(500)
            .with_body(r#"{"error": "boom"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(server.url()).unwrap();
        let result = client.post("/broken", &json!({})).await;

        assert!(matches!(result, Err(AgentError::Network(_))));
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/html")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = BackendClient::new(server.url()).unwrap();
        let result = client.get("/html", &[]).await;

        assert!(matches!(result, Err(AgentError::InvalidResponse(_))));
    }
}
