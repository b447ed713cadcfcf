//! Batch job configuration.
//!
//! A job is described by a YAML document (or built in code), optionally adjusted by
//! `AI_BATCH_*` environment variables, and validated once before any record runs.

use crate::resilience::{BackoffStrategy, RetryPolicy};
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Keyring service name consulted for credentials.
pub const KEYRING_SERVICE: &str = "ai-batch";
/// Keyring user name consulted for credentials.
pub const KEYRING_USER: &str = "openai";
/// Environment variable consulted for credentials after the keyring.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Linear,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJobConfig {
    /// Bearer credential. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub user_prompt_template: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default)]
    pub backoff: BackoffKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_max_ms: Option<u64>,
    /// Column that receives the raw model output.
    #[serde(default = "default_result_column")]
    pub result_column: String,
    /// Column bound to `{{text}}` in the prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_column: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_model() -> String {
    crate::tokens::DEFAULT_PRICING_MODEL.to_string()
}
fn default_concurrency() -> usize {
    5
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_result_column() -> String {
    "llm_output".to_string()
}
fn default_base_url() -> String {
    crate::client::builder::DEFAULT_BASE_URL.to_string()
}

impl BatchJobConfig {
    pub fn new(user_prompt_template: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: default_model(),
            system_prompt: None,
            user_prompt_template: user_prompt_template.into(),
            temperature: 0.0,
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff: BackoffKind::Linear,
            backoff_max_ms: None,
            result_column: default_result_column(),
            text_column: None,
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_concurrency(mut self, k: usize) -> Self {
        self.concurrency = k;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base_ms = base.as_millis() as u64;
        self
    }

    pub fn with_result_column(mut self, column: impl Into<String>) -> Self {
        self.result_column = column.into();
        self
    }

    pub fn with_text_column(mut self, column: impl Into<String>) -> Self {
        self.text_column = Some(column.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read job config: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `AI_BATCH_CONCURRENCY`, `AI_BATCH_MAX_RETRIES`, `AI_BATCH_MODEL` and
    /// `AI_BATCH_BASE_URL` when set. Unparseable numbers are ignored.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(k) = std::env::var("AI_BATCH_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|v| *v > 0)
        {
            self.concurrency = k;
        }
        if let Some(n) = std::env::var("AI_BATCH_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.max_retries = n;
        }
        if let Ok(model) = std::env::var("AI_BATCH_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
        if let Ok(url) = std::env::var("AI_BATCH_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        self
    }

    /// Fill in the credential when none was given: OS keyring first, then `OPENAI_API_KEY`.
    pub fn resolve_credential(mut self) -> Self {
        if self.has_credential() {
            return self;
        }
        // 1. Try Keyring
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(key) = entry.get_password() {
                debug!("credential resolved from keyring");
                self.api_key = Some(key);
                return self;
            }
        }
        // 2. Try Environment Variable
        self.api_key = std::env::var(API_KEY_ENV).ok();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }

    /// Fail fast on anything that would make every record fail.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: &str| {
            Err(Error::configuration_with_context(
                msg.to_string(),
                ErrorContext::new()
                    .with_field_path(format!("config.{}", field))
                    .with_source("config_validator"),
            ))
        };

        if !self.has_credential() {
            return invalid("api_key", "missing API credential");
        }
        if self.user_prompt_template.trim().is_empty() {
            return invalid("user_prompt_template", "prompt template is empty");
        }
        if self.model.trim().is_empty() {
            return invalid("model", "model identifier is empty");
        }
        if self.concurrency == 0 {
            return invalid("concurrency", "concurrency limit must be at least 1");
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature", "temperature must be within [0, 2]");
        }
        if self.result_column.trim().is_empty() {
            return invalid("result_column", "result column name is empty");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.backoff_base_ms);
        let strategy = match self.backoff {
            BackoffKind::Linear => BackoffStrategy::Linear,
            BackoffKind::Exponential => BackoffStrategy::Exponential {
                max_delay: Duration::from_millis(
                    self.backoff_max_ms
                        .unwrap_or_else(|| self.backoff_base_ms.saturating_mul(32)),
                ),
            },
        };
        RetryPolicy::new(self.max_retries, base).with_strategy(strategy)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let cfg = BatchJobConfig::from_yaml_str("user_prompt_template: \"Classify {{text}}\"\n")
            .unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.concurrency, 5);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.backoff_base_ms, 1000);
        assert_eq!(cfg.backoff, BackoffKind::Linear);
        assert_eq!(cfg.result_column, "llm_output");
        assert_eq!(cfg.base_url, "https://api.openai.com");
        assert!(cfg.api_key.is_none());
        assert!(cfg.text_column.is_none());
    }

    #[test]
    fn test_yaml_full() {
        let yaml = r#"
model: gpt-4o
system_prompt: "Answer in JSON"
user_prompt_template: "{{json}}"
temperature: 0.7
concurrency: 8
max_retries: 4
backoff: exponential
backoff_base_ms: 200
backoff_max_ms: 1000
result_column: verdict
text_column: body
"#;
        let cfg = BatchJobConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.system_prompt.as_deref(), Some("Answer in JSON"));
        assert_eq!(cfg.concurrency, 8);
        assert_eq!(cfg.text_column.as_deref(), Some("body"));
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_template_is_yaml_error() {
        let err = BatchJobConfig::from_yaml_str("model: gpt-4o\n").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let cfg = BatchJobConfig::new("t").with_api_key("sk-secret");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("sk-secret"));
    }

    #[test]
    fn test_validate_missing_credential() {
        let err = BatchJobConfig::new("Hello {{name}}").validate().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("config.api_key")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = BatchJobConfig::new("t").with_api_key("sk-test");
        assert!(base.validate().is_ok());
        assert!(base.clone().with_concurrency(0).validate().is_err());
        assert!(base.clone().with_temperature(2.5).validate().is_err());
        assert!(base.clone().with_temperature(f64::NAN).validate().is_err());
        assert!(base.clone().with_result_column(" ").validate().is_err());
        assert!(BatchJobConfig::new("  ")
            .with_api_key("sk-test")
            .validate()
            .is_err());
    }

    #[test]
    fn test_explicit_credential_kept() {
        let cfg = BatchJobConfig::new("t")
            .with_api_key("sk-explicit")
            .resolve_credential();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn test_linear_retry_policy() {
        let cfg = BatchJobConfig::new("t").with_backoff_base(Duration::from_millis(250));
        let policy = cfg.retry_policy();
        assert_eq!(policy.strategy, BackoffStrategy::Linear);
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
    }
}
