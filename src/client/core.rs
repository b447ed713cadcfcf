use crate::client::types::{ChatCompletionResponse, Completion, CompletionRequest};
use crate::transport::{HttpTransport, TransportError};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Anything that can turn a [`CompletionRequest`] into a [`Completion`].
///
/// The batch orchestrator only talks to this trait, so tests and alternative
/// providers can stand in for the HTTP client.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

#[async_trait]
impl<T: CompletionBackend + ?Sized> CompletionBackend for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        (**self).complete(request).await
    }
}

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
pub struct CompletionClient {
    pub(crate) transport: HttpTransport,
    pub(crate) api_key: String,
    pub(crate) path: String,
}

impl CompletionClient {
    pub fn builder() -> crate::client::builder::CompletionClientBuilder {
        crate::client::builder::CompletionClientBuilder::new()
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.transport.base_url(), self.path)
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let client_request_id = Uuid::new_v4().to_string();
        let body = serde_json::to_value(request.to_body())?;

        let start = std::time::Instant::now();
        let resp = self
            .transport
            .post_json(&self.path, &body, &self.api_key, Some(&client_request_id))
            .await?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        if !status.is_success() {
            info!(
                http_status = status.as_u16(),
                client_request_id = client_request_id.as_str(),
                model = request.model.as_str(),
                duration_ms = start.elapsed().as_millis(),
                "completion request failed"
            );
            return Err(Error::Remote {
                status: status.as_u16(),
                message: text,
            });
        }

        let malformed = |details: String| {
            Error::runtime_with_context(
                "malformed completion response",
                ErrorContext::new()
                    .with_details(details)
                    .with_source("completion_client"),
            )
        };
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| malformed(e.to_string()))?;
        let (content, usage) = parsed
            .into_content()
            .ok_or_else(|| malformed("missing choices[0].message.content".to_string()))?;

        debug!(
            http_status = status.as_u16(),
            client_request_id = client_request_id.as_str(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            duration_ms = start.elapsed().as_millis(),
            "completion request finished"
        );

        Ok(Completion { content, usage })
    }
}
