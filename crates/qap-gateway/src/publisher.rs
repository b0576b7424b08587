//! Best-effort fan-out of event records to the QAP and Analytics subjects.
//!
//! Nothing here fails the request path: every error is logged and absorbed.

use std::sync::Arc;

use bytes::Bytes;
use qap_nats::{ConnectionStatus, PublishClient};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::events::EventRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Qap,
    Analytics,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qap => "qap",
            Self::Analytics => "analytics",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("NATS connection is not available")]
    NotConnected,
    #[error("{0} channel not configured")]
    NotConfigured(&'static str),
    #[error("publish failed: {0}")]
    Client(String),
}

#[derive(Clone)]
pub struct EventPublisher<N> {
    client: Option<N>,
    qap_subject: Arc<str>,
    analytics_subject: Arc<str>,
}

impl<N> EventPublisher<N>
where
    N: PublishClient + ConnectionStatus,
{
    pub fn new(
        client: Option<N>,
        qap_subject: impl Into<Arc<str>>,
        analytics_subject: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            client,
            qap_subject: qap_subject.into(),
            analytics_subject: analytics_subject.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|client| client.is_connected())
    }

    fn subject(&self, channel: Channel) -> &str {
        match channel {
            Channel::Qap => &self.qap_subject,
            Channel::Analytics => &self.analytics_subject,
        }
    }

    /// Publishes `payload` on `channel`. Failures are logged before being
    /// returned; callers are free to ignore the result.
    pub async fn publish(&self, channel: Channel, payload: Bytes) -> Result<(), PublishError> {
        let result = self.try_publish(channel, payload).await;
        if let Err(e) = &result {
            error!(channel = channel.as_str(), error = %e, "Failed to publish event");
        }
        result
    }

    async fn try_publish(&self, channel: Channel, payload: Bytes) -> Result<(), PublishError> {
        let client = match &self.client {
            Some(client) if client.is_connected() => client,
            _ => return Err(PublishError::NotConnected),
        };

        let subject = self.subject(channel).trim();
        if subject.is_empty() {
            return Err(PublishError::NotConfigured(channel.as_str()));
        }

        client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| PublishError::Client(e.to_string()))?;

        debug!(channel = channel.as_str(), subject, "Published event");
        Ok(())
    }

    pub async fn publish_qap(&self, payload: Bytes) -> Result<(), PublishError> {
        self.publish(Channel::Qap, payload).await
    }

    pub async fn publish_analytics(&self, payload: Bytes) -> Result<(), PublishError> {
        self.publish(Channel::Analytics, payload).await
    }

    /// Serializes `record` once and sends it to both channels on a detached
    /// task. Returns `None` when the record could not be serialized.
    pub fn publish_event(&self, record: &EventRecord) -> Option<JoinHandle<()>> {
        self.publish_event_after(record, None)
    }

    /// Like [`publish_event`](Self::publish_event), but the detached task
    /// waits for `previous` to finish before publishing, so events of one
    /// exchange reach the bus in the order they were produced.
    pub fn publish_event_after(
        &self,
        record: &EventRecord,
        previous: Option<JoinHandle<()>>,
    ) -> Option<JoinHandle<()>> {
        let payload = match record.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!(kind = record.kind.as_str(), error = %e, "Failed to serialize event");
                return None;
            }
        };

        let publisher = self.clone();
        Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    error!(error = %e, "Earlier event task did not complete");
                }
            }
            let _ = publisher.publish_qap(payload.clone()).await;
            let _ = publisher.publish_analytics(payload).await;
        }))
    }
}
