//! The per-request interception state machine.
//!
//! ```text
//! read body ─► publish request event ─► access gate ─► forward upstream
//!                                                          │
//!        write response ◄─ publish response event ◄─ merge headers
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use qap_nats::{ConnectionStatus, PublishClient};
use tracing::field::Empty;
use tracing::{Instrument, Span, info_span};
use uuid::Uuid;

use crate::access::{AccessDecision, AccessGate};
use crate::aliases::resolve_api_path;
use crate::config::{GatewayConfig, RouteConfig};
use crate::error::InterceptError;
use crate::events::EventRecord;
use crate::forward::Forwarder;
use crate::headers::{diagnostic_overlays, inbound_headers, merge};
use crate::publisher::EventPublisher;

/// Handles the interceptor is built from.
///
/// `bus` is `None` when the NATS connection could not be set up; traffic is
/// still proxied, only events are lost.
#[derive(Clone)]
pub struct Capabilities<N> {
    pub bus: Option<N>,
    pub http: reqwest::Client,
}

pub struct Interceptor<N> {
    config: Arc<GatewayConfig>,
    route: RouteConfig,
    publisher: EventPublisher<N>,
    access_gate: Option<AccessGate>,
    forwarder: Forwarder,
}

/// Everything the later stages need once the body has been buffered.
struct ForwardContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    original_path: String,
    api_path: String,
}

impl ForwardContext {
    fn new(parts: Parts, body: Bytes, route: &RouteConfig) -> Self {
        let original_path = parts.uri.path().to_string();
        let api_path = resolve_api_path(&original_path, route.endpoint());
        Self {
            method: parts.method,
            headers: inbound_headers(&parts.headers),
            uri: parts.uri,
            body,
            original_path,
            api_path,
        }
    }
}

impl<N> Interceptor<N>
where
    N: PublishClient + ConnectionStatus,
{
    pub fn new(
        config: Arc<GatewayConfig>,
        route: RouteConfig,
        capabilities: Capabilities<N>,
    ) -> Self {
        let publisher = EventPublisher::new(
            capabilities.bus,
            config.qap_subject(),
            config.analytics_subject(),
        );
        let access_gate = AccessGate::from_config(&config, capabilities.http.clone());
        let forwarder = Forwarder::from_config(&config, capabilities.http);

        Self {
            config,
            route,
            publisher,
            access_gate,
            forwarder,
        }
    }

    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    pub fn publisher(&self) -> &EventPublisher<N> {
        &self.publisher
    }

    /// Runs one exchange to completion. Never fails: errors become their
    /// mapped HTTP response.
    pub async fn handle(&self, request: Request) -> Response {
        let span = info_span!(
            "qap.intercept",
            correlation_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
            api_path = Empty,
            status = Empty
        );

        self.intercept(request)
            .instrument(span)
            .await
            .unwrap_or_else(IntoResponse::into_response)
    }

    async fn intercept(&self, request: Request) -> Result<Response, InterceptError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, self.config.max_body_bytes())
            .await
            .map_err(InterceptError::ReadBody)?;

        let ctx = ForwardContext::new(parts, body, &self.route);
        Span::current().record("api_path", ctx.api_path.as_str());

        let request_event = self.publisher.publish_event(&EventRecord::request(
            &ctx.original_path,
            &ctx.method,
            &ctx.headers,
            &ctx.body,
        ));

        if let Some(gate) = &self.access_gate {
            let decision = gate
                .check(&ctx.headers)
                .await
                .map_err(InterceptError::CheckUnavailable)?;
            if let AccessDecision::Denied(denied) = decision {
                return Err(InterceptError::AccessDenied(denied));
            }
        }

        let upstream = self
            .forwarder
            .forward(&ctx.method, &ctx.uri, &ctx.headers, ctx.body.clone())
            .await?;
        Span::current().record("status", upstream.status.as_u16());

        let overlays = diagnostic_overlays(
            &ctx.api_path,
            upstream.status,
            self.route.gateway_name(),
            &ctx.headers,
        );
        let headers = merge(&upstream.headers, &overlays);

        self.publisher.publish_event_after(
            &EventRecord::response(
                &ctx.original_path,
                &ctx.method,
                upstream.status,
                &headers,
                &upstream.body,
            ),
            request_event,
        );

        let mut response = Response::new(Body::from(upstream.body));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
