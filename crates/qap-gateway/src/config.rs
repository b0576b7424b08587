//! Gateway and per-route configuration.

use std::time::Duration;

use qap_nats::NatsConfig;
use qap_std::env::ReadEnv;
use serde_json::{Map, Value};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCESS_CHECK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_BODY_BYTES: usize = usize::MAX;
pub const DEFAULT_GATEWAY_NAME: &str = "unknown-gateway";

/// Process-wide interceptor configuration.
///
/// Resolved from environment variables:
/// - `NATS_QUEUE_QAP` / `NATS_QUEUE_ANALYTICS`: subjects receiving every event
/// - `ENDPOINT_CHECK`: access-check URL; blank or unset disables the gate
/// - `QAP_GATEWAY_PORT`: HTTP listening port (default: 8080)
/// - `QAP_UPSTREAM_URL`: base URL that origin-form requests are forwarded to
/// - `QAP_UPSTREAM_TIMEOUT_SECS`: upstream call timeout (default: 30)
/// - `QAP_ACCESS_CHECK_TIMEOUT_SECS`: access-check call timeout (default: 10)
/// - `QAP_MAX_BODY_BYTES`: largest request body buffered (default: unlimited)
/// - Standard `NATS_*` variables for the connection (see `qap-nats`)
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub(crate) nats: NatsConfig,
    pub(crate) qap_subject: String,
    pub(crate) analytics_subject: String,
    pub(crate) endpoint_check: Option<String>,
    pub(crate) port: u16,
    pub(crate) upstream_url: Option<String>,
    pub(crate) upstream_timeout: Duration,
    pub(crate) access_check_timeout: Duration,
    pub(crate) max_body_bytes: usize,
}

impl GatewayConfig {
    pub fn new(
        nats: NatsConfig,
        qap_subject: impl Into<String>,
        analytics_subject: impl Into<String>,
    ) -> Self {
        Self {
            nats,
            qap_subject: qap_subject.into(),
            analytics_subject: analytics_subject.into(),
            endpoint_check: None,
            port: DEFAULT_PORT,
            upstream_url: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            access_check_timeout: Duration::from_secs(DEFAULT_ACCESS_CHECK_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        Self {
            nats: NatsConfig::from_env(env),
            qap_subject: env.non_blank("NATS_QUEUE_QAP").unwrap_or_default(),
            analytics_subject: env.non_blank("NATS_QUEUE_ANALYTICS").unwrap_or_default(),
            endpoint_check: env.non_blank("ENDPOINT_CHECK"),
            port: env.parse_or("QAP_GATEWAY_PORT", DEFAULT_PORT),
            upstream_url: env.non_blank("QAP_UPSTREAM_URL"),
            upstream_timeout: Duration::from_secs(
                env.parse_or("QAP_UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS),
            ),
            access_check_timeout: Duration::from_secs(env.parse_or(
                "QAP_ACCESS_CHECK_TIMEOUT_SECS",
                DEFAULT_ACCESS_CHECK_TIMEOUT_SECS,
            )),
            max_body_bytes: env.parse_or("QAP_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Set the access-check endpoint. A blank value disables the gate.
    pub fn with_endpoint_check(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint_check = Some(endpoint.trim().to_string()).filter(|e| !e.is_empty());
        self
    }

    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = Some(url.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_access_check_timeout(mut self, timeout: Duration) -> Self {
        self.access_check_timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn nats(&self) -> &NatsConfig {
        &self.nats
    }

    pub fn qap_subject(&self) -> &str {
        &self.qap_subject
    }

    pub fn analytics_subject(&self) -> &str {
        &self.analytics_subject
    }

    pub fn endpoint_check(&self) -> Option<&str> {
        self.endpoint_check.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn upstream_url(&self) -> Option<&str> {
        self.upstream_url.as_deref()
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }

    pub fn access_check_timeout(&self) -> Duration {
        self.access_check_timeout
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

/// Values the host gateway attaches to a single route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    gateway_name: String,
    endpoint: Option<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            gateway_name: DEFAULT_GATEWAY_NAME.to_string(),
            endpoint: None,
        }
    }
}

impl RouteConfig {
    pub fn new(gateway_name: impl Into<String>) -> Self {
        Self {
            gateway_name: gateway_name.into(),
            endpoint: None,
        }
    }

    /// Override the path reported in `X-API-Path`. An empty or whitespace-only
    /// value clears the override, so a padded placeholder in the host config
    /// never reports a blank path.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = Some(endpoint).filter(|e| !e.trim().is_empty());
        self
    }

    /// `QAP_GATEWAY_NAME` and `QAP_ENDPOINT`.
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let route = Self::new(
            env.non_blank("QAP_GATEWAY_NAME")
                .unwrap_or_else(|| DEFAULT_GATEWAY_NAME.to_string()),
        );
        match env.non_blank("QAP_ENDPOINT") {
            Some(endpoint) => route.with_endpoint(endpoint),
            None => route,
        }
    }

    /// Read the host gateway's per-route "extra" object.
    ///
    /// Recognises the `gateway_name` and `endpoint` keys; anything that is not
    /// a string is ignored.
    pub fn from_extra(extra: &Map<String, Value>) -> Self {
        let gateway_name = extra
            .get("gateway_name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_GATEWAY_NAME);
        let route = Self::new(gateway_name);
        match extra.get("endpoint").and_then(Value::as_str) {
            Some(endpoint) => route.with_endpoint(endpoint),
            None => route,
        }
    }

    pub fn gateway_name(&self) -> &str {
        &self.gateway_name
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}
