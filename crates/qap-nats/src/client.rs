use async_nats::Client as NatsAsyncClient;
use async_nats::connection::State;
use async_nats::subject::ToSubject;
use bytes::Bytes;
use std::error::Error;
use std::future::Future;

/// Core NATS publish, without headers or acknowledgement.
pub trait PublishClient: Send + Sync + Clone + 'static {
    type PublishError: Error + Send + Sync + 'static;

    fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), Self::PublishError>> + Send;
}

/// Point-in-time view of the connection.
///
/// Checked before every publish; a client that connected once may have
/// dropped since.
pub trait ConnectionStatus: Send + Sync + Clone + 'static {
    fn is_connected(&self) -> bool;
}

impl PublishClient for NatsAsyncClient {
    type PublishError = async_nats::client::PublishError;

    async fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), Self::PublishError> {
        NatsAsyncClient::publish(self, subject, payload).await
    }
}

impl ConnectionStatus for NatsAsyncClient {
    fn is_connected(&self) -> bool {
        matches!(self.connection_state(), State::Connected)
    }
}
