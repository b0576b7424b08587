//! Out-of-band access check performed before a request is forwarded.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use tracing::{debug, instrument};

use crate::config::GatewayConfig;
use crate::headers::outbound_headers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(AccessDenied),
}

/// The checker answered with something other than 200.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("endpoint: {endpoint} - return: {status} - {body}")]
pub struct AccessDenied {
    pub endpoint: String,
    pub status: u16,
    pub body: String,
}

/// The checker could not be reached (DNS, connect, timeout).
#[derive(Debug, thiserror::Error)]
#[error("access check request to {endpoint} failed: {source}")]
pub struct AccessCheckError {
    endpoint: String,
    #[source]
    source: reqwest::Error,
}

impl AccessCheckError {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    endpoint: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl AccessGate {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
            timeout,
        }
    }

    /// `None` when no access-check endpoint is configured.
    pub fn from_config(config: &GatewayConfig, http: reqwest::Client) -> Option<Self> {
        config
            .endpoint_check()
            .map(|endpoint| Self::new(endpoint, http, config.access_check_timeout()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the endpoint with the caller's headers; 200 allows the request.
    #[instrument(name = "qap.access_check", skip_all, fields(endpoint = %self.endpoint))]
    pub async fn check(&self, headers: &HeaderMap) -> Result<AccessDecision, AccessCheckError> {
        let response = self
            .http
            .get(&self.endpoint)
            .headers(outbound_headers(headers))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| AccessCheckError {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Access check answered");

        if status == StatusCode::OK {
            return Ok(AccessDecision::Allowed);
        }

        // The body is diagnostic only; an unreadable one still means denied.
        let body = response.text().await.unwrap_or_default();
        Ok(AccessDecision::Denied(AccessDenied {
            endpoint: self.endpoint.clone(),
            status: status.as_u16(),
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use qap_nats::NatsConfig;

    fn gate(endpoint: String) -> AccessGate {
        AccessGate::new(endpoint, reqwest::Client::new(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn ok_response_allows_and_forwards_caller_headers() {
        let server = MockServer::start_async().await;
        let check = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/check")
                    .header("authorization", "Bearer caller-token")
                    .header("x-user-email", "ana@example.com");
                then.status(200);
            })
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer caller-token"));
        headers.insert("x-user-email", HeaderValue::from_static("ana@example.com"));

        let decision = gate(server.url("/check")).check(&headers).await.unwrap();

        assert_eq!(decision, AccessDecision::Allowed);
        check.assert_async().await;
    }

    #[tokio::test]
    async fn non_ok_response_denies_with_diagnostics() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/check");
                then.status(403).body("token expired");
            })
            .await;

        let endpoint = server.url("/check");
        let decision = gate(endpoint.clone()).check(&HeaderMap::new()).await.unwrap();

        let AccessDecision::Denied(denied) = decision else {
            panic!("expected denial, got {decision:?}");
        };
        assert_eq!(denied.endpoint, endpoint);
        assert_eq!(denied.status, 403);
        assert_eq!(denied.body, "token expired");
        assert!(denied.to_string().contains("403"));
    }

    #[tokio::test]
    async fn other_success_codes_are_still_denied() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/check");
                then.status(204);
            })
            .await;

        let decision = gate(server.url("/check")).check(&HeaderMap::new()).await.unwrap();
        assert!(matches!(decision, AccessDecision::Denied(AccessDenied { status: 204, .. })));
    }

    #[tokio::test]
    async fn unreachable_checker_is_an_error_not_a_denial() {
        let err = gate("http://127.0.0.1:1/check".to_string())
            .check(&HeaderMap::new())
            .await
            .unwrap_err();

        assert_eq!(err.endpoint(), "http://127.0.0.1:1/check");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn from_config_requires_endpoint() {
        let base = GatewayConfig::new(NatsConfig::from_url("localhost:4222"), "q", "a");
        assert!(AccessGate::from_config(&base, reqwest::Client::new()).is_none());

        let configured = base
            .with_endpoint_check("http://auth/check")
            .with_access_check_timeout(Duration::from_secs(3));
        let gate = AccessGate::from_config(&configured, reqwest::Client::new()).unwrap();
        assert_eq!(gate.endpoint(), "http://auth/check");
        assert_eq!(gate.timeout, Duration::from_secs(3));
    }
}
