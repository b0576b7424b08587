//! # qap-nats
//!
//! NATS plumbing for the QAP gateway interceptor.
//!
//! This crate provides:
//! - [`NatsConfig`] resolved from `NATS_*` environment variables
//! - [`connect`], which supervises the connection with unlimited, fixed-interval
//!   reconnects and reports lifecycle events through `tracing`
//! - Per-operation client traits ([`PublishClient`], [`ConnectionStatus`]) so
//!   callers depend only on what they use
//! - Mock clients for testing (with the `test-support` feature)
//!
//! ```rust,no_run
//! use qap_nats::{NatsConfig, connect};
//! use qap_std::SystemEnv;
//!
//! # async fn run() -> Result<(), qap_nats::ConnectError> {
//! let config = NatsConfig::from_env(&SystemEnv);
//! let client = connect(&config).await?;
//! # let _ = client;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connect;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use client::{ConnectionStatus, PublishClient};
pub use config::{NatsAuth, NatsConfig};
pub use connect::{ConnectError, connect};

#[cfg(any(test, feature = "test-support"))]
pub use mocks::{MockError, MockNatsClient, PublishedMessage};
