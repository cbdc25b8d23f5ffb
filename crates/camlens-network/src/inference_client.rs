//! 원격 추론 클라이언트.
//!
//! `POST {endpoint}` 에 `{file, model, prompt, images: [base64]}` JSON을 보낸다.
//! 업스트림 실패는 에러로 전파하지 않고 응답 텍스트로 바꿔 반환한다:
//! 비정상 상태 코드는 `Error <status>: <body>`, 전송 실패는 `Connection error: <msg>`.
//! 타임아웃과 재시도는 없다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use camlens_core::config::InferenceConfig;
use camlens_core::error::CoreError;
use camlens_core::models::frame::NormalizedFrame;
use camlens_core::ports::inference::InferenceClient;

/// 응답에 `response` 필드가 없을 때 쓰는 텍스트
pub const MISSING_RESPONSE_TEXT: &str = "No response received";

/// 업스트림 실패: 경계에서 응답 텍스트로 변환된다
#[derive(Debug, Error)]
enum UpstreamError {
    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Connection error: invalid response body ({0})")]
    InvalidBody(String),
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    file: &'a str,
    model: &'a str,
    prompt: &'a str,
    images: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct InferenceReply {
    #[serde(default)]
    response: Option<String>,
}

/// HTTP 추론 클라이언트: `InferenceClient` 포트 구현
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, CoreError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            "HttpInferenceClient 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        frame: &NormalizedFrame,
        prompt: &str,
        file_name: &str,
    ) -> Result<String, UpstreamError> {
        let body = InferenceRequest {
            file: file_name,
            model: &self.model,
            prompt,
            images: [frame.base64.as_str()],
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let reply: InferenceReply =
            serde_json::from_str(&text).map_err(|e| UpstreamError::InvalidBody(e.to_string()))?;

        Ok(reply
            .response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| MISSING_RESPONSE_TEXT.to_string()))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn infer(&self, frame: &NormalizedFrame, prompt: &str, file_name: &str) -> String {
        debug!(
            file = %file_name,
            size = frame.base64_len(),
            "추론 요청"
        );

        match self.request(frame, prompt, file_name).await {
            Ok(text) => {
                debug!(file = %file_name, chars = text.chars().count(), "추론 응답 수신");
                text
            }
            Err(e) => {
                warn!(file = %file_name, "추론 실패: {e}");
                e.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(endpoint: String) -> HttpInferenceClient {
        HttpInferenceClient::new(&InferenceConfig {
            endpoint,
            model: "llava:7b".to_string(),
        })
        .unwrap()
    }

    fn frame() -> NormalizedFrame {
        NormalizedFrame::new(vec![1, 2, 3], 672, 672, Local::now())
    }

    #[tokio::test]
    async fn sends_expected_body_and_reads_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/llava")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "file": "capture_20260309_140507_000.jpg",
                "model": "llava:7b",
                "prompt": "What is in this picture?",
                "images": ["AQID"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"A mug on a desk"}"#)
            .create_async()
            .await;

        let client = client_for(format!("{}/llava", server.url()));
        let text = client
            .infer(
                &frame(),
                "What is in this picture?",
                "capture_20260309_140507_000.jpg",
            )
            .await;

        assert_eq!(text, "A mug on a desk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_response_field_uses_placeholder() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/llava")
            .with_status(200)
            .with_body(r#"{"done":true}"#)
            .create_async()
            .await;

        let client = client_for(format!("{}/llava", server.url()));
        assert_eq!(
            client.infer(&frame(), "x", "a.jpg").await,
            MISSING_RESPONSE_TEXT
        );
    }

    #[tokio::test]
    async fn error_status_becomes_response_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/llava")
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;

        let client = client_for(format!("{}/llava", server.url()));
        assert_eq!(
            client.infer(&frame(), "x", "a.jpg").await,
            "Error 500: server error"
        );
    }

    #[tokio::test]
    async fn not_found_status_becomes_response_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/llava")
            .with_status(404)
            .with_body("model not loaded")
            .create_async()
            .await;

        let client = client_for(format!("{}/llava", server.url()));
        assert_eq!(
            client.infer(&frame(), "x", "a.jpg").await,
            "Error 404: model not loaded"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_connection_error() {
        // 포트 1은 열려 있지 않음
        let client = client_for("http://127.0.0.1:1/llava".to_string());
        let text = client.infer(&frame(), "x", "a.jpg").await;
        assert!(text.starts_with("Connection error: "), "got: {text}");
    }

    #[tokio::test]
    async fn non_json_success_body_is_connection_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/llava")
            .with_status(200)
            .with_body("<html>proxy page</html>")
            .create_async()
            .await;

        let client = client_for(format!("{}/llava", server.url()));
        let text = client.infer(&frame(), "x", "a.jpg").await;
        assert!(text.starts_with("Connection error: "), "got: {text}");
    }
}
