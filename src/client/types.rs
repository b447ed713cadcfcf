//! Request/response types for one completion call.

use crate::tokens::TokenUsage;
use crate::types::Message;
use serde::{Deserialize, Serialize};

/// Everything needed for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            temperature: 0.0,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Wire body for the chat-completion endpoint.
    pub fn to_body(&self) -> ChatCompletionBody {
        ChatCompletionBody {
            model: self.model.clone(),
            messages: Message::conversation(self.system.as_deref(), self.prompt.clone()),
            temperature: self.temperature,
        }
    }
}

/// Model reply plus the usage the endpoint reported for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionBody {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn into_content(self) -> Option<(String, TokenUsage)> {
        let usage = self.usage.unwrap_or_default();
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|content| (content, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_with_system() {
        let req = CompletionRequest::new("gpt-4o-mini", "Rate this")
            .system("You are a judge")
            .temperature(0.2);
        let body = serde_json::to_value(req.to_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "You are a judge"},
                    {"role": "user", "content": "Rate this"}
                ],
                "temperature": 0.2
            })
        );
    }

    #[test]
    fn test_body_without_system() {
        let body = serde_json::to_value(CompletionRequest::new("m", "p").to_body()).unwrap();
        assert_eq!(body["messages"], json!([{"role": "user", "content": "p"}]));
    }

    #[test]
    fn test_response_usage_defaults() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "hi"}}],
            "usage": {"prompt_tokens": 12}
        }))
        .unwrap();
        let (content, usage) = resp.into_content().unwrap();
        assert_eq!(content, "hi");
        assert_eq!(usage, TokenUsage::new(12, 0));
    }

    #[test]
    fn test_response_without_choices() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.into_content().is_none());
    }
}
