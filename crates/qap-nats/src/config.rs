use std::fmt;
use std::time::Duration;

use qap_std::env::ReadEnv;

const ENV_NATS_URL: &str = "NATS_URL";
const ENV_NATS_TOKEN: &str = "NATS_TOKEN";
const ENV_NATS_RECONNECT_WAIT_SECS: &str = "NATS_RECONNECT_WAIT_SECS";
const ENV_NATS_CONNECT_TIMEOUT_SECS: &str = "NATS_CONNECT_TIMEOUT_SECS";

const DEFAULT_NATS_URL: &str = "localhost:4222";
const DEFAULT_RECONNECT_WAIT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// NATS authentication method.
#[derive(Clone, PartialEq, Eq)]
pub enum NatsAuth {
    Token(String),
    None,
}

impl NatsAuth {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::None => "none",
        }
    }
}

// Keeps the token out of logs that print the config with `?`.
impl fmt::Debug for NatsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::None => f.write_str("None"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub servers: Vec<String>,
    pub auth: NatsAuth,
    /// Fixed wait between reconnect attempts. Attempts are unlimited.
    pub reconnect_wait: Duration,
    pub connection_timeout: Duration,
}

impl NatsConfig {
    pub fn new(servers: Vec<String>, auth: NatsAuth) -> Self {
        Self {
            servers,
            auth,
            reconnect_wait: Duration::from_secs(DEFAULT_RECONNECT_WAIT_SECS),
            connection_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self::new(vec![url.into()], NatsAuth::None)
    }

    pub fn with_reconnect_wait(mut self, wait: Duration) -> Self {
        self.reconnect_wait = wait;
        self
    }

    /// Build config from environment variables.
    ///
    /// - `NATS_URL`: comma-separated server list (default: `localhost:4222`)
    /// - `NATS_TOKEN`: token auth; blank or unset means no auth
    /// - `NATS_RECONNECT_WAIT_SECS`: wait between reconnect attempts (default: 10)
    /// - `NATS_CONNECT_TIMEOUT_SECS`: per-attempt connect timeout (default: 10)
    pub fn from_env<E: ReadEnv>(env: &E) -> Self {
        let auth = env
            .non_blank(ENV_NATS_TOKEN)
            .map(NatsAuth::Token)
            .unwrap_or(NatsAuth::None);

        Self {
            servers: servers_from_env(env),
            auth,
            reconnect_wait: Duration::from_secs(
                env.parse_or(ENV_NATS_RECONNECT_WAIT_SECS, DEFAULT_RECONNECT_WAIT_SECS),
            ),
            connection_timeout: Duration::from_secs(
                env.parse_or(ENV_NATS_CONNECT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        }
    }
}

fn servers_from_env<E: ReadEnv>(env: &E) -> Vec<String> {
    let servers: Vec<String> = env
        .var(ENV_NATS_URL)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if servers.is_empty() {
        vec![DEFAULT_NATS_URL.to_string()]
    } else {
        servers
    }
}
