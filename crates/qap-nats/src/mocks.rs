use crate::client::{ConnectionStatus, PublishClient};
use async_nats::subject::ToSubject;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Bytes,
}

/// In-memory stand-in for a NATS client.
///
/// Starts connected. Clones share state, so a test can keep one handle for
/// assertions while the code under test owns another.
#[derive(Debug, Clone)]
pub struct MockNatsClient {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    connected: Arc<AtomicBool>,
    failing_subjects: Arc<Mutex<HashSet<String>>>,
}

impl MockNatsClient {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
            failing_subjects: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn disconnected() -> Self {
        let mock = Self::new();
        mock.set_connected(false);
        mock
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every publish to `subject` fails until the mock is dropped.
    pub fn fail_subject(&self, subject: impl Into<String>) {
        self.failing_subjects.lock().unwrap().insert(subject.into());
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_subjects(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.subject.clone())
            .collect()
    }

    pub fn published_to(&self, subject: &str) -> Vec<Bytes> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.subject == subject)
            .map(|m| m.payload.clone())
            .collect()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

impl Default for MockNatsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishClient for MockNatsClient {
    type PublishError = MockError;

    async fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), MockError> {
        let subject = subject.to_subject().to_string();
        if self.failing_subjects.lock().unwrap().contains(&subject) {
            return Err(MockError(format!("simulated publish failure on {subject}")));
        }
        self.published
            .lock()
            .unwrap()
            .push(PublishedMessage { subject, payload });
        Ok(())
    }
}

impl ConnectionStatus for MockNatsClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
