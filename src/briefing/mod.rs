//! Optional AI-written committee briefing for the appetite report.
//!
//! The briefing never affects classification: every failure is logged and
//! surfaces as [`BriefingStatus::Unavailable`].

pub mod client;
pub mod prompt;

pub use client::{BriefingClient, BriefingError};

use tracing::{debug, info, warn};

use crate::config::BriefingConfig;
use crate::pipeline::AssessedMetric;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefingStatus {
    Available(String),
    /// Reason the briefing could not be produced
    Unavailable(String),
}

impl BriefingStatus {
    pub fn text(&self) -> Option<&str> {
        match self {
            BriefingStatus::Available(text) => Some(text),
            BriefingStatus::Unavailable(_) => None,
        }
    }
}

/// Ask the configured service for a briefing, bounded by the configured timeout.
pub async fn committee_briefing(
    config: &BriefingConfig,
    metrics: &[AssessedMetric],
) -> BriefingStatus {
    if !config.enabled() {
        return BriefingStatus::Unavailable("disabled".to_string());
    }
    if metrics.is_empty() {
        return BriefingStatus::Unavailable("no metrics to brief on".to_string());
    }

    let client = match BriefingClient::from_config(config) {
        Ok(c) => c,
        Err(e) => {
            info!("briefing skipped: {}", e);
            return BriefingStatus::Unavailable(e.to_string());
        }
    };

    request(&client, metrics).await
}

/// Issue the briefing call through an already-built client.
pub async fn request(client: &BriefingClient, metrics: &[AssessedMetric]) -> BriefingStatus {
    let prompt = prompt::committee_prompt(metrics);
    debug!(chars = prompt.len(), "requesting committee briefing");

    let limit = client.timeout();
    let result = match tokio::time::timeout(limit, client.complete(&prompt)).await {
        Ok(result) => result,
        Err(_) => Err(BriefingError::Timeout(limit)),
    };

    match result {
        Ok(text) => {
            info!("committee briefing received");
            BriefingStatus::Available(text)
        }
        Err(e) => {
            warn!("committee briefing unavailable: {}", e);
            BriefingStatus::Unavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::MetricRecord;
    use crate::scoring::appetite::evaluate;
    use crate::scoring::Direction;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn metrics() -> Vec<AssessedMetric> {
        let record = MetricRecord {
            metric: "Overdue Risk Reviews".to_string(),
            owner: "CRO".to_string(),
            current: 7.0,
            appetite: 5.0,
            tolerance: 8.0,
            direction: Direction::LowerIsBetter,
            prior: Some(6.0),
            unit: None,
            period: None,
            action: None,
            framework: None,
            history: vec![],
        };
        let status = evaluate(7.0, 5.0, 8.0, Direction::LowerIsBetter, Some(6.0)).unwrap();
        vec![AssessedMetric { record, status }]
    }

    /// Serve exactly one canned HTTP response, optionally after a delay.
    async fn one_shot_server(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    fn test_client(endpoint: String, timeout: Duration) -> BriefingClient {
        BriefingClient::new(endpoint, "test-model", "key", 300, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_is_unavailable() {
        let config = BriefingConfig {
            enabled: Some(false),
            ..Default::default()
        };
        let status = committee_briefing(&config, &metrics()).await;
        assert_eq!(status, BriefingStatus::Unavailable("disabled".to_string()));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let config = BriefingConfig {
            api_key_env: Some("RISK_BRO_TEST_NO_SUCH_KEY".to_string()),
            ..Default::default()
        };
        let status = committee_briefing(&config, &metrics()).await;
        assert!(matches!(
            status,
            BriefingStatus::Unavailable(ref r) if r.contains("RISK_BRO_TEST_NO_SUCH_KEY")
        ));
    }

    #[tokio::test]
    async fn test_successful_briefing() {
        let endpoint = one_shot_server(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  Appetite position is stable.  "}}]}"#,
            Duration::ZERO,
        )
        .await;
        let client = test_client(endpoint, Duration::from_secs(5));
        let status = request(&client, &metrics()).await;
        assert_eq!(
            status,
            BriefingStatus::Available("Appetite position is stable.".to_string())
        );
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let endpoint = one_shot_server(
            "500 Internal Server Error",
            r#"{"error":"boom"}"#,
            Duration::ZERO,
        )
        .await;
        let client = test_client(endpoint, Duration::from_secs(5));
        let status = request(&client, &metrics()).await;
        assert!(matches!(status, BriefingStatus::Unavailable(ref r) if r.contains("500")));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let endpoint = one_shot_server("200 OK", r#"{"choices":[]}"#, Duration::from_secs(5)).await;
        let client = test_client(endpoint, Duration::from_millis(200));
        let status = request(&client, &metrics()).await;
        assert!(matches!(status, BriefingStatus::Unavailable(ref r) if r.contains("timed out")));
    }

    #[tokio::test]
    async fn test_empty_choices_is_unavailable() {
        let endpoint = one_shot_server("200 OK", r#"{"choices":[]}"#, Duration::ZERO).await;
        let client = test_client(endpoint, Duration::from_secs(5));
        let status = request(&client, &metrics()).await;
        assert_eq!(
            status,
            BriefingStatus::Unavailable("response contained no briefing text".to_string())
        );
    }
}
