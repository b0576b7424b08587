//! Event records published for every intercepted request and response.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::headers::canonical_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Request,
    Response,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// Snapshot of one side of an exchange.
///
/// Serialized field order is `type, path, method, http_status, headers, body`.
/// Header names are canonical (`Content-Type`, `X-API-Path`) and sorted;
/// values keep their wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub path: String,
    pub method: String,
    /// `0` for request events.
    pub http_status: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl EventRecord {
    pub fn request(path: &str, method: &Method, headers: &HeaderMap, body: &[u8]) -> Self {
        Self {
            kind: EventKind::Request,
            path: path.to_string(),
            method: method.as_str().to_string(),
            http_status: 0,
            headers: header_multimap(headers),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    pub fn response(
        path: &str,
        method: &Method,
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        Self {
            kind: EventKind::Response,
            path: path.to_string(),
            method: method.as_str().to_string(),
            http_status: status.as_u16(),
            headers: header_multimap(headers),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    pub fn to_payload(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}

fn header_multimap(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(canonical_name(name))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}
