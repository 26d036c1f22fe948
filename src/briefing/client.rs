use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::BriefingConfig;

/// Failures talking to the chat-completions service.
#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),

    #[error("request timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no briefing text")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct BriefingClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    timeout: Duration,
}

impl BriefingClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, BriefingError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("risk-bro/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens,
            timeout,
        })
    }

    /// Build a client from config, reading the API key from the configured environment variable.
    pub fn from_config(config: &BriefingConfig) -> Result<Self, BriefingError> {
        let var = config.api_key_env();
        let api_key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BriefingError::MissingApiKey(var.to_string()))?;
        Self::new(
            config.endpoint(),
            config.model(),
            api_key,
            config.max_tokens(),
            config.timeout(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a single user prompt and return the first choice's text.
    pub async fn complete(&self, prompt: &str) -> Result<String, BriefingError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BriefingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.classify(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BriefingError::EmptyResponse)
    }

    fn classify(&self, e: reqwest::Error) -> BriefingError {
        if e.is_timeout() {
            BriefingError::Timeout(self.timeout)
        } else {
            BriefingError::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BriefingError::MissingApiKey("GROQ_API_KEY".to_string());
        assert_eq!(err.to_string(), "API key not configured (set GROQ_API_KEY)");

        let err = BriefingError::Timeout(Duration::from_secs(20));
        assert_eq!(err.to_string(), "request timed out after 20s");
    }

    #[test]
    fn test_missing_key_from_config() {
        let config = BriefingConfig {
            api_key_env: Some("RISK_BRO_TEST_UNSET_KEY_VAR".to_string()),
            ..Default::default()
        };
        let err = BriefingClient::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            BriefingError::MissingApiKey(ref v) if v == "RISK_BRO_TEST_UNSET_KEY_VAR"
        ));
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "llama3-8b-8192",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: 300,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 300);
    }
}
