//! Telegram Bot API notifier.
//!
//! Sends `POST {base_url}/bot{token}/sendMessage` with a JSON body. Failed
//! sends are retried with a fixed delay, all within one overall timeout.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{Notifier, NotifyError};
use crate::retry::{RetryConfig, RetryResult, retry_with_fixed_delay};

/// Public Bot API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Default overall timeout for one message (5 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Telegram connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub base_url: String,
    pub bot_token: String,

    /// Upper bound on one message, retries included.
    pub request_timeout: Duration,

    pub retry: RetryConfig,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        TelegramConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            bot_token: bot_token.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryConfig::DEFAULT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

// The token is a credential; keep it out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Sends messages to Telegram chats and channels.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        TelegramNotifier { client, config }
    }

    async fn send_once(&self, url: &str, body: &SendMessageRequest<'_>) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Notifier for TelegramNotifier {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let url = self.config.send_message_url();
        let body = SendMessageRequest {
            chat_id: destination,
            text,
            parse_mode: "HTML",
        };
        let deadline = Instant::now() + self.config.request_timeout;

        let result = retry_with_fixed_delay(self.config.retry, deadline, || {
            self.send_once(&url, &body)
        })
        .await;

        match result {
            RetryResult::Success(()) => {
                debug!(destination, "Message sent to Telegram");
                Ok(())
            }
            RetryResult::ExhaustedRetries {
                last_error,
                attempts,
            } => {
                warn!(attempts, error = %last_error, "Telegram send retries exhausted");
                Err(last_error)
            }
            RetryResult::DeadlineExceeded { attempts, .. } => {
                warn!(attempts, "Telegram send timed out");
                Err(NotifyError::Timeout(self.config.request_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::serve;
    use axum::Json;
    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
        failures_left: Arc<Mutex<u32>>,
    }

    async fn send_message(
        State(captured): State<Captured>,
        Path(bot): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, &'static str) {
        captured.requests.lock().unwrap().push((bot, body));
        let mut failures = captured.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return (StatusCode::BAD_GATEWAY, r#"{"ok":false}"#);
        }
        (StatusCode::OK, r#"{"ok":true}"#)
    }

    async fn telegram_stub(failures: u32) -> (String, Captured) {
        let captured = Captured::default();
        *captured.failures_left.lock().unwrap() = failures;
        let app = Router::new()
            .route("/{bot}/sendMessage", post(send_message))
            .with_state(captured.clone());
        (serve(app).await, captured)
    }

    fn notifier(base_url: &str, max_attempts: u32) -> TelegramNotifier {
        TelegramNotifier::new(
            reqwest::Client::new(),
            TelegramConfig::new("123:abc")
                .with_base_url(base_url)
                .with_request_timeout(Duration::from_secs(10))
                .with_retry(RetryConfig::new(max_attempts, Duration::from_millis(10))),
        )
    }

    #[test]
    fn url_includes_token() {
        let config = TelegramConfig::new("123:abc").with_base_url("https://example.org/");
        assert_eq!(
            config.send_message_url(),
            "https://example.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn debug_hides_token() {
        let config = TelegramConfig::new("secret-token");
        assert!(!format!("{:?}", config).contains("secret-token"));
    }

    #[tokio::test]
    async fn posts_html_message_to_destination() {
        let (base, captured) = telegram_stub(0).await;

        notifier(&base, 3)
            .send_message("@queue_channel", "🔔 <b>open</b>")
            .await
            .unwrap();

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (bot, body) = &requests[0];
        assert_eq!(bot, "bot123:abc");
        assert_eq!(body["chat_id"], "@queue_channel");
        assert_eq!(body["text"], "🔔 <b>open</b>");
        assert_eq!(body["parse_mode"], "HTML");
    }

    #[tokio::test]
    async fn retries_rejected_sends() {
        let (base, captured) = telegram_stub(2).await;

        notifier(&base, 3)
            .send_message("@queue_channel", "hi")
            .await
            .unwrap();

        assert_eq!(captured.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn reports_rejection_after_budget() {
        let (base, captured) = telegram_stub(5).await;

        let err = notifier(&base, 2)
            .send_message("@queue_channel", "hi")
            .await
            .unwrap_err();

        match err {
            NotifyError::Rejected { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("false"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(captured.requests.lock().unwrap().len(), 2);
    }
}
