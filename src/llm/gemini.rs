//! Gemini REST 客户端

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use std::pin::Pin;
use tracing::{debug, error};

use crate::config::{Config, DEFAULT_GEMINI_API_URL};
use crate::error::{AgentError, Result};
use crate::llm::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use crate::llm::ChatModel;

pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        GeminiClient {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .with_api_url(config.gemini_api_url.clone())
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_url, self.model, method)
    }

    async fn check_status(response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::TOO_MANY_REQUESTS => Err(AgentError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AgentError::Unauthorized),
            status => {
                let message = response.text().await.unwrap_or_default();
                error!("Gemini API error {}: {}", status, message);
                Err(AgentError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// 单次非流式请求
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        debug!("generateContent on {}", self.model);

        let response = self
            .client
            .post(self.method_url("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AgentError::ResponseParseFailed(e.to_string()))
    }

    /// 基于 SSE 的流式请求，每个 `data:` 行对应一个响应块
    pub async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        debug!("streamGenerateContent on {}", self.model);

        let response = self
            .client
            .post(self.method_url("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        let bytes = Self::check_status(response).await?.bytes_stream();

        Ok(Box::pin(stream! {
            // 按字节缓冲，多字节字符可能跨越网络分块
            let mut buffer: Vec<u8> = Vec::new();
            let mut failed = false;

            for await chunk in bytes {
                match chunk {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);
                        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                            let line: Vec<u8> = buffer.drain(..=newline).collect();
                            match decode_line(line) {
                                Ok(line) => {
                                    if let Some(event) = parse_sse_line(&line) {
                                        yield event;
                                    }
                                }
                                Err(e) => {
                                    failed = true;
                                    yield Err(e);
                                    break;
                                }
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Err(e) => {
                        failed = true;
                        yield Err(AgentError::StreamFailed(e.to_string()));
                        break;
                    }
                }
            }

            // 最后一个事件可能没有结尾换行符
            if !failed && !buffer.is_empty() {
                match decode_line(buffer) {
                    Ok(line) => {
                        if let Some(event) = parse_sse_line(&line) {
                            yield event;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                    }
                }
            }
        }))
    }
}

fn decode_line(line: Vec<u8>) -> Result<String> {
    String::from_utf8(line).map_err(|e| AgentError::StreamFailed(e.to_string()))
}

fn parse_sse_line(line: &str) -> Option<Result<GenerateContentResponse>> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(
        serde_json::from_str::<GenerateContentResponse>(data)
            .map_err(|e| AgentError::ResponseParseFailed(e.to_string())),
    )
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(
        &self,
        request: &GenerateContentRequest,
        on_text: &(dyn for<'a> Fn(&'a str) + Send + Sync),
    ) -> Result<Content> {
        let mut stream = self.stream_generate_content(request).await?;
        let mut text = String::new();
        let mut calls = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for part in chunk.parts() {
                if let Some(delta) = part.text.as_deref() {
                    on_text(delta);
                    text.push_str(delta);
                }
                if part.function_call.is_some() {
                    calls.push(part.clone());
                }
            }
        }

        let mut parts = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            parts.push(Part::text(text));
        }
        parts.extend(calls);

        Ok(Content::model(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;
    use std::sync::Mutex;

    fn client(url: String) -> GeminiClient {
        GeminiClient::new("test-key".to_string(), "gemini-test".to_string()).with_api_url(url)
    }

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content::system("be brief")),
            contents: vec![Content::user_text("hello")],
            tools: vec![],
        }
    }

    #[test]
    fn test_client_defaults() {
        let client = GeminiClient::new("k".to_string(), "gemini-2.0-flash-exp".to_string());
        assert_eq!(client.model(), "gemini-2.0-flash-exp");
        assert_eq!(
            client.method_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_parse_sse_line() {
        assert!(parse_sse_line(": keep-alive\n").is_none());
        assert!(parse_sse_line("\r\n").is_none());
        let event = parse_sse_line("data: {\"candidates\": []}\r\n").unwrap().unwrap();
        assert!(event.candidates.is_empty());
        assert!(parse_sse_line("data: {oops").unwrap().is_err());
    }

    #[tokio::test]
    async fn test_generate_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-test:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Hi"}]}}]}"#)
            .create_async()
            .await;

        let response = client(server.url()).generate_content(&request()).await.unwrap();

        assert_eq!(response.parts()[0].text.as_deref(), Some("Hi"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_streamed_turn_is_assembled() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"Let me \"}]}}]}\r\n\r\n",
            "data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"check.\"}]}}]}\r\n\r\n",
            "data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"functionCall\": {\"name\": \"get_all_pools\", \"args\": {}}}]}}]}\r\n\r\n"
        );
        let mock = server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let seen = Mutex::new(Vec::new());
        let on_text = |delta: &str| seen.lock().unwrap().push(delta.to_string());
        let content = client(server.url())
            .generate(&request(), &on_text)
            .await
            .unwrap();

        assert_eq!(content.role.as_deref(), Some("model"));
        assert_eq!(content.text(), "Let me check.");
        assert_eq!(content.function_calls().next().unwrap().name, "get_all_pools");
        assert_eq!(*seen.lock().unwrap(), vec!["Let me ", "check."]);
        mock.assert_async().await;
    }

    /// 按给定的字节片段逐段写出 SSE 响应体
    async fn chunked_stream_mock(server: &mut mockito::Server, pieces: Vec<Vec<u8>>) -> mockito::Mock {
        server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                for piece in &pieces {
                    w.write_all(piece)?;
                    w.flush()?;
                }
                Ok(())
            })
            .create_async()
            .await
    }

    fn text_event(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            serde_json::json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
        )
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let mut server = mockito::Server::new_async().await;
        let body = text_event("💱 swap").into_bytes();
        let emoji_at = body
            .windows(4)
            .position(|w| w == "💱".as_bytes())
            .unwrap();
        let (head, tail) = body.split_at(emoji_at + 2);
        let mock = chunked_stream_mock(&mut server, vec![head.to_vec(), tail.to_vec()]).await;

        let seen = Mutex::new(Vec::new());
        let on_text = |delta: &str| seen.lock().unwrap().push(delta.to_string());
        let content = client(server.url())
            .generate(&request(), &on_text)
            .await
            .unwrap();

        assert_eq!(content.text(), "💱 swap");
        assert_eq!(*seen.lock().unwrap(), vec!["💱 swap"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_data_line_split_mid_json() {
        let mut server = mockito::Server::new_async().await;
        let first = text_event("Pools: ");
        let second = text_event("two.");
        let (head, tail) = second.split_at(second.len() / 2);
        let mock = chunked_stream_mock(
            &mut server,
            vec![
                format!("{}{}", first, head).into_bytes(),
                tail.as_bytes().to_vec(),
            ],
        )
        .await;

        let content = client(server.url())
            .generate(&request(), &|_: &str| {})
            .await
            .unwrap();

        assert_eq!(content.text(), "Pools: two.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_last_event_without_trailing_newline() {
        let mut server = mockito::Server::new_async().await;
        let last = text_event("done");
        let mock = chunked_stream_mock(
            &mut server,
            vec![
                text_event("All ").into_bytes(),
                last.trim_end().as_bytes().to_vec(),
            ],
        )
        .await;

        let content = client(server.url())
            .generate(&request(), &|_: &str| {})
            .await
            .unwrap();

        assert_eq!(content.text(), "All done");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_fails_stream() {
        let mut server = mockito::Server::new_async().await;
        let mock = chunked_stream_mock(&mut server, vec![b"data: \xff\xfe\n".to_vec()]).await;

        let result = client(server.url()).generate(&request(), &|_: &str| {}).await;

        assert!(matches!(result, Err(AgentError::StreamFailed(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-test:generateContent")
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("POST", "/models/gemini-test:streamGenerateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let client = client(server.url());
        assert!(matches!(
            client.generate_content(&request()).await,
            Err(AgentError::RateLimited)
        ));
        match client.generate(&request(), &|_: &str| {}).await {
            Err(AgentError::ApiError { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
