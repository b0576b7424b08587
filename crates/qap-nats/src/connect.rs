use crate::config::{NatsAuth, NatsConfig};
use async_nats::{Client, ConnectOptions, Event};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Failed to connect to NATS servers {servers:?}: {error}")]
    ConnectionFailed {
        servers: Vec<String>,
        #[source]
        error: async_nats::ConnectError,
    },
}

fn reconnect_delay(wait: Duration, attempts: usize) -> Duration {
    debug!(attempts, delay_secs = wait.as_secs(), "NATS reconnect delay");
    wait
}

fn handle_event(event: Event) {
    match event {
        Event::Connected => info!("Connected to NATS"),
        Event::Disconnected => error!("Disconnected from NATS"),
        Event::Closed => error!("Connection to NATS closed"),
        Event::ServerError(err) => warn!(error = %err, "NATS server error"),
        Event::ClientError(err) => warn!(error = %err, "NATS client error"),
        Event::SlowConsumer(sid) => warn!(sid, "NATS slow consumer detected"),
        Event::LameDuckMode => warn!("NATS server entering lame duck mode"),
        Event::Draining => info!("NATS connection draining"),
    }
}

fn connect_options(config: &NatsConfig) -> ConnectOptions {
    let base = match &config.auth {
        NatsAuth::Token(token) => ConnectOptions::with_token(token.clone()),
        NatsAuth::None => ConnectOptions::new(),
    };
    let wait = config.reconnect_wait;

    base.retry_on_initial_connect()
        .max_reconnects(None::<usize>)
        .connection_timeout(config.connection_timeout)
        .reconnect_delay_callback(move |attempts| reconnect_delay(wait, attempts))
        .event_callback(|event| async move { handle_event(event) })
}

/// Connect to NATS with unlimited, fixed-interval reconnection.
///
/// The initial connection is also retried in the background, so this returns
/// a client even while the servers are unreachable. Callers must check
/// [`ConnectionStatus`](crate::ConnectionStatus) before relying on it.
#[instrument(name = "nats.connect", skip(config), fields(servers = ?config.servers, auth = %config.auth.description()))]
pub async fn connect(config: &NatsConfig) -> Result<Client, ConnectError> {
    info!(
        reconnect_wait_secs = config.reconnect_wait.as_secs(),
        "Connecting to NATS"
    );

    match connect_options(config).connect(&config.servers).await {
        Ok(client) => Ok(client),
        Err(e) => {
            error!(error = %e, "Failed to connect to NATS");
            Err(ConnectError::ConnectionFailed {
                servers: config.servers.clone(),
                error: e,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_delay_is_fixed() {
        let wait = Duration::from_secs(10);
        assert_eq!(reconnect_delay(wait, 0), wait);
        assert_eq!(reconnect_delay(wait, 1), wait);
        assert_eq!(reconnect_delay(wait, 50), wait);
        assert_eq!(reconnect_delay(wait, usize::MAX), wait);
    }

    #[test]
    fn handle_event_covers_all_variants() {
        use async_nats::{ClientError, ServerError};

        handle_event(Event::Connected);
        handle_event(Event::Disconnected);
        handle_event(Event::Closed);
        handle_event(Event::ServerError(ServerError::Other("test".to_string())));
        handle_event(Event::ClientError(ClientError::Other("test".to_string())));
        handle_event(Event::SlowConsumer(42));
        handle_event(Event::LameDuckMode);
        handle_event(Event::Draining);
    }

    #[test]
    fn connect_error_display_names_servers() {
        let err = ConnectError::ConnectionFailed {
            servers: vec!["nats://bus:4222".to_string()],
            error: async_nats::ConnectError::from(async_nats::ConnectErrorKind::TimedOut),
        };

        let msg = err.to_string();
        assert!(msg.contains("Failed to connect to NATS servers"));
        assert!(msg.contains("nats://bus:4222"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
