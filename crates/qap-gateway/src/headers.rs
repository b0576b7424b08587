//! Header capture for outbound calls and the diagnostic overlay merged into
//! every proxied response.

use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, HOST, TRAILER, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::warn;

pub const X_API_PATH: HeaderName = HeaderName::from_static("x-api-path");
pub const X_STATUS: HeaderName = HeaderName::from_static("x-status");
pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
pub const X_AUTHORIZATION: HeaderName = HeaderName::from_static("x-authorization");

/// Header name as it appears in event records: each `-`-separated segment
/// capitalised (`content-type` becomes `Content-Type`), except `X-API-Path`
/// which keeps its conventional spelling.
pub fn canonical_name(name: &HeaderName) -> String {
    if *name == X_API_PATH {
        return "X-API-Path".to_string();
    }

    name.as_str()
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// The caller's headers as captured for events and outbound copies.
///
/// `Host` is dropped: the authority travels in the request URL.
pub fn inbound_headers(headers: &HeaderMap) -> HeaderMap {
    let mut captured = headers.clone();
    captured.remove(HOST);
    captured
}

/// Headers to copy onto an outbound call. Framing headers are left for the
/// HTTP client to compute from the body actually sent.
pub fn outbound_headers(headers: &HeaderMap) -> HeaderMap {
    let mut outbound = inbound_headers(headers);
    for framing in [CONTENT_LENGTH, TRANSFER_ENCODING, TRAILER] {
        outbound.remove(framing);
    }
    outbound
}

/// One header set on top of the upstream response, replacing every upstream
/// value of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOverlay {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl HeaderOverlay {
    fn text(name: HeaderName, value: &str) -> Option<Self> {
        match HeaderValue::from_str(value) {
            Ok(value) => Some(Self { name, value }),
            Err(e) => {
                warn!(header = %name, error = %e, "Skipping diagnostic header with invalid value");
                None
            }
        }
    }

    fn copied(name: HeaderName, from: &HeaderMap, source: HeaderName) -> Option<Self> {
        from.get(source)
            .filter(|value| !value.is_empty())
            .map(|value| Self {
                name,
                value: value.clone(),
            })
    }
}

/// Diagnostic overlays in application order: `X-API-Path`, `X-Status`,
/// `X-Api-Key`, then `X-User-Email` and `X-Authorization` when the caller
/// sent `X-User-Email` / `Authorization`.
pub fn diagnostic_overlays(
    api_path: &str,
    status: StatusCode,
    gateway_name: &str,
    inbound: &HeaderMap,
) -> Vec<HeaderOverlay> {
    [
        HeaderOverlay::text(X_API_PATH, api_path),
        HeaderOverlay::text(X_STATUS, status.as_str()),
        HeaderOverlay::text(X_API_KEY, gateway_name),
        HeaderOverlay::copied(X_USER_EMAIL, inbound, X_USER_EMAIL),
        HeaderOverlay::copied(X_AUTHORIZATION, inbound, AUTHORIZATION),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Upstream headers with `overlays` applied in order.
pub fn merge(upstream: &HeaderMap, overlays: &[HeaderOverlay]) -> HeaderMap {
    let mut merged = upstream.clone();
    for overlay in overlays {
        merged.insert(overlay.name.clone(), overlay.value.clone());
    }
    merged
}
