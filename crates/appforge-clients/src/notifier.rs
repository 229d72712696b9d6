//! Evaluation notifier with bounded retries
//!
//! Posts the [`EvaluationPayload`] to the caller's evaluation URL. Every
//! non-2xx status and every transport error counts as one failed attempt;
//! nothing is distinguished as non-retryable. Between attempts the notifier
//! waits `base_delay * 2^attempt_index`, and never after the last attempt.

use appforge_core::config::NotifierConfig;
use appforge_core::{AppforgeError, EvaluationPayload, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Delivers evaluation payloads
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns `true` once the endpoint accepts the payload, `false` when
    /// the attempt budget is exhausted
    async fn submit(&self, payload: &EvaluationPayload, url: &str) -> bool;
}

/// One delivery attempt (allows mocking in tests)
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Post the payload as JSON and return the response status code
    async fn post_json(&self, url: &str, payload: &EvaluationPayload) -> Result<u16>;
}

/// Suspends between attempts (allows recording delays in tests)
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay before the retry that follows attempt `attempt_index` (0-based)
pub fn backoff_delay(base: Duration, attempt_index: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt_index))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// HTTP transport owning one lazily created, reusable client
///
/// [`HttpTransport::shutdown`] releases the client; the next attempt
/// creates a fresh one.
#[derive(Debug, Default)]
pub struct HttpTransport {
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a client is currently held
    pub fn is_open(&self) -> bool {
        self.client.lock().is_some()
    }

    /// Release the client if one is open
    pub fn shutdown(&self) {
        if self.client.lock().take().is_some() {
            tracing::debug!("Released evaluation HTTP client");
        }
    }

    fn client(&self) -> Result<reqwest::Client> {
        let mut guard = self.client.lock();
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppforgeError::Notification(format!("Failed to build client: {}", e)))?;
        tracing::debug!("Opened evaluation HTTP client");
        *guard = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &EvaluationPayload) -> Result<u16> {
        let client = self.client()?;
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| AppforgeError::Notification(format!("Failed to send request: {}", e)))?;

        Ok(response.status().as_u16())
    }
}

/// Retrying notifier over a transport and a sleeper
pub struct EvaluationNotifier<T = HttpTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    max_attempts: u32,
    base_delay: Duration,
}

impl EvaluationNotifier {
    /// Create a notifier over HTTP with the configured retry policy
    pub fn new(config: &NotifierConfig) -> Self {
        Self::with_parts(
            HttpTransport::new(),
            TokioSleeper,
            config.max_attempts,
            config.base_delay(),
        )
    }

    /// Release the underlying HTTP client
    pub fn shutdown(&self) {
        self.transport.shutdown();
    }
}

impl<T: DeliveryTransport, S: Sleeper> EvaluationNotifier<T, S> {
    pub fn with_parts(transport: T, sleeper: S, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            transport,
            sleeper,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[async_trait]
impl<T: DeliveryTransport, S: Sleeper> Notifier for EvaluationNotifier<T, S> {
    async fn submit(&self, payload: &EvaluationPayload, url: &str) -> bool {
        for attempt in 0..self.max_attempts {
            match self.transport.post_json(url, payload).await {
                Ok(status) if is_success(status) => {
                    tracing::info!(
                        "Submitted evaluation for {} round {} (attempt {})",
                        payload.task(),
                        payload.round(),
                        attempt + 1
                    );
                    return true;
                }
                Ok(status) => {
                    tracing::warn!(
                        "Evaluation submission attempt {}/{} failed with status {}",
                        attempt + 1,
                        self.max_attempts,
                        status
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Evaluation submission attempt {}/{} failed: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                }
            }

            if attempt + 1 < self.max_attempts {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::info!("Retrying evaluation submission in {:?}", delay);
                self.sleeper.sleep(delay).await;
            }
        }

        tracing::error!(
            "Failed to submit evaluation for {} after {} attempts",
            payload.task(),
            self.max_attempts
        );
        false
    }
}
