use crate::client::core::CompletionClient;
use crate::transport::{HttpSettings, HttpTransport};
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Builder for [`CompletionClient`].
pub struct CompletionClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    path: Option<String>,
    settings: Option<HttpSettings>,
    timeout: Option<Duration>,
}

impl CompletionClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            path: None,
            settings: None,
            timeout: None,
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the endpoint host (mock servers, proxies, compatible providers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn http_settings(mut self, settings: HttpSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Per-request timeout; takes precedence over `AI_HTTP_TIMEOUT_SECS`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CompletionClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "API key required",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_source("completion_client_builder"),
                )
            })?;

        let mut settings = self.settings.unwrap_or_else(HttpSettings::from_env);
        if let Some(t) = self.timeout {
            settings = settings.with_timeout(t);
        }
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let transport = HttpTransport::new(&base_url, &settings)?;

        Ok(CompletionClient {
            transport,
            api_key,
            path: self
                .path
                .unwrap_or_else(|| DEFAULT_COMPLETIONS_PATH.to_string()),
        })
    }
}

impl Default for CompletionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = CompletionClientBuilder::new().build().err().unwrap();
        assert!(err.is_configuration());
        let err = CompletionClientBuilder::new().api_key("  ").build().err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_endpoint_defaults() {
        let client = CompletionClientBuilder::new().api_key("sk-test").build().unwrap();
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_endpoint_override() {
        let client = CompletionClientBuilder::new()
            .api_key("sk-test")
            .base_url("http://127.0.0.1:9999/")
            .path("/chat")
            .build()
            .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9999/chat");
    }
}
