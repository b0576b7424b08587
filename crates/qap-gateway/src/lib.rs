//! Inline API gateway interceptor that mirrors traffic to NATS.
//!
//! # Architecture
//!
//! ```text
//! Client ─► [qap-gateway (axum)]
//!              │ buffers the body, publishes a `request` event ──► NATS_QUEUE_QAP
//!              │                                              └─► NATS_QUEUE_ANALYTICS
//!              │ GET ENDPOINT_CHECK with the caller's headers (optional)
//!              │    non-200 ⇒ 403, unreachable ⇒ 500
//!              ▼
//!           Upstream (QAP_UPSTREAM_URL or absolute request URI)
//!              │
//!              ▼ upstream headers + X-API-Path, X-Status, X-Api-Key,
//!                X-User-Email, X-Authorization
//!           publishes a `response` event, returns the upstream response
//! ```
//!
//! Event publishing is best effort: a missing or disconnected bus never
//! changes what the client receives.

pub mod access;
pub mod aliases;
pub mod config;
pub mod error;
pub mod events;
pub mod forward;
pub mod headers;
pub mod interceptor;
pub mod publisher;
pub mod server;

pub use access::{AccessCheckError, AccessDecision, AccessDenied, AccessGate};
pub use config::{GatewayConfig, RouteConfig};
pub use error::InterceptError;
pub use events::{EventKind, EventRecord};
pub use forward::{ForwardError, Forwarder, UpstreamResponse};
pub use interceptor::{Capabilities, Interceptor};
pub use publisher::{Channel, EventPublisher, PublishError};
