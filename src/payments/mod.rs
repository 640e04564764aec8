//! Payment processor boundary: capture a previously authorized charge.
//!
//! The processor itself is an external collaborator; this module defines
//! the [`PaymentProcessor`] seam and an HTTP client implementation. The
//! capture coordinator owns timeout policy and the follow-up state write.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Capture operation against the external payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync + std::fmt::Debug {
    /// Captures the previously authorized charge identified by
    /// `payment_intent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UpstreamFailure`] on processor rejection
    /// (including already-captured) or transport failure. Callers treat
    /// every error identically: log and leave the booking retryable.
    async fn capture(&self, payment_intent_id: &str) -> Result<(), GatewayError>;
}

/// HTTP client for the processor's capture endpoint.
///
/// Issues `POST {base_url}/payment_intents/{id}/capture` with bearer
/// authentication. The request carries its own bounded timeout so a hung
/// processor cannot stall the transition path beyond the configured limit.
#[derive(Debug, Clone)]
pub struct HttpCaptureClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpCaptureClient {
    /// Creates a capture client with the given endpoint, key, and per-call
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl PaymentProcessor for HttpCaptureClient {
    async fn capture(&self, payment_intent_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/payment_intents/{payment_intent_id}/capture", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamFailure(format!("capture request: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::UpstreamFailure(format!(
            "capture rejected with {status}: {body}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> HttpCaptureClient {
        match HttpCaptureClient::new(base_url, "sk_test".to_string(), Duration::from_secs(2)) {
            Ok(client) => client,
            Err(e) => panic!("client construction failed: {e}"),
        }
    }

    #[tokio::test]
    async fn capture_succeeds_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment_intents/pi_42/capture"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(server.uri()).capture("pi_42").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn capture_maps_processor_rejection_to_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payment_intents/pi_42/capture"))
            .respond_with(ResponseTemplate::new(402).set_body_string("charge_already_captured"))
            .mount(&server)
            .await;

        let result = client(server.uri()).capture("pi_42").await;
        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(matches!(err, GatewayError::UpstreamFailure(_)));
        assert!(err.to_string().contains("402"));
    }

    #[tokio::test]
    async fn capture_maps_transport_failure_to_upstream_failure() {
        // Nothing listens on this port.
        let result = client("http://127.0.0.1:1".to_string()).capture("pi_42").await;
        assert!(matches!(result, Err(GatewayError::UpstreamFailure(_))));
    }
}
