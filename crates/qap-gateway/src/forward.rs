//! Replays the buffered request against the upstream service.

use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use bytes::Bytes;
use reqwest::Url;
use tracing::{debug, instrument};

use crate::config::GatewayConfig;
use crate::headers::outbound_headers;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to build forward request: {0}")]
    Build(String),
    #[error("{0}")]
    Send(#[source] reqwest::Error),
    #[error("failed to read upstream body: {0}")]
    ReadBody(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct Forwarder {
    http: reqwest::Client,
    upstream_url: Option<String>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(http: reqwest::Client, upstream_url: Option<String>, timeout: Duration) -> Self {
        Self {
            http,
            upstream_url,
            timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig, http: reqwest::Client) -> Self {
        Self::new(
            http,
            config.upstream_url().map(str::to_string),
            config.upstream_timeout(),
        )
    }

    /// Absolute request URIs are used verbatim; origin-form ones are joined
    /// onto the upstream base URL.
    pub fn target_url(&self, uri: &Uri) -> Result<Url, ForwardError> {
        let raw = if uri.scheme().is_some() {
            uri.to_string()
        } else {
            let base = self.upstream_url.as_deref().ok_or_else(|| {
                ForwardError::Build(format!("no upstream configured for {uri}"))
            })?;
            let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
            format!("{}{}", base.trim_end_matches('/'), path_and_query)
        };

        Url::parse(&raw).map_err(|e| ForwardError::Build(format!("invalid URL {raw}: {e}")))
    }

    #[instrument(name = "qap.forward", skip_all, fields(method = %method, uri = %uri))]
    pub async fn forward(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, ForwardError> {
        let url = self.target_url(uri)?;

        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(outbound_headers(headers))
            .timeout(self.timeout);

        if !body.is_empty() {
            builder = builder.body(body);
        }

        let upstream = builder.send().await.map_err(ForwardError::Send)?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let body = upstream.bytes().await.map_err(ForwardError::ReadBody)?;

        debug!(status = status.as_u16(), bytes = body.len(), "Upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    fn forwarder(upstream: Option<String>) -> Forwarder {
        Forwarder::new(reqwest::Client::new(), upstream, Duration::from_secs(5))
    }

    #[test]
    fn origin_form_is_joined_onto_upstream_base() {
        let f = forwarder(Some("http://api.internal:9000/".to_string()));
        let uri: Uri = "/v1/items?page=2".parse().unwrap();

        assert_eq!(
            f.target_url(&uri).unwrap().as_str(),
            "http://api.internal:9000/v1/items?page=2"
        );
    }

    #[test]
    fn absolute_uri_is_used_as_is() {
        let f = forwarder(Some("http://ignored".to_string()));
        let uri: Uri = "http://other.host/path?q=1".parse().unwrap();

        assert_eq!(f.target_url(&uri).unwrap().as_str(), "http://other.host/path?q=1");
    }

    #[test]
    fn origin_form_without_upstream_fails_to_build() {
        let uri: Uri = "/v1/items".parse().unwrap();
        let err = forwarder(None).target_url(&uri).unwrap_err();
        assert!(matches!(err, ForwardError::Build(_)));
    }

    #[tokio::test]
    async fn forwards_method_body_and_headers() {
        let server = MockServer::start_async().await;
        let upstream = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/orders")
                    .query_param("dry", "true")
                    .header("x-user-email", "ana@example.com")
                    .body("{\"x\":1}");
                then.status(201)
                    .header("content-type", "application/json")
                    .body("{\"id\":7}");
            })
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-user-email", HeaderValue::from_static("ana@example.com"));
        headers.insert("content-length", HeaderValue::from_static("999"));

        let uri: Uri = "/orders?dry=true".parse().unwrap();
        let response = forwarder(Some(server.base_url()))
            .forward(&Method::POST, &uri, &headers, Bytes::from_static(b"{\"x\":1}"))
            .await
            .unwrap();

        upstream.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(response.body, Bytes::from_static(b"{\"id\":7}"));
    }

    #[tokio::test]
    async fn upstream_error_status_is_returned_not_raised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("nope");
            })
            .await;

        let uri: Uri = "/missing".parse().unwrap();
        let response = forwarder(Some(server.base_url()))
            .forward(&Method::GET, &uri, &HeaderMap::new(), Bytes::new())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, Bytes::from_static(b"nope"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_send_error() {
        let uri: Uri = "/anything".parse().unwrap();
        let err = forwarder(Some("http://127.0.0.1:1".to_string()))
            .forward(&Method::GET, &uri, &HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Send(_)));
    }
}
