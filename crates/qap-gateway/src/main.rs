//! QAP gateway binary.
//!
//! Accepts any HTTP request on `QAP_GATEWAY_PORT`, mirrors it to NATS,
//! optionally gates it on `ENDPOINT_CHECK`, and proxies it to
//! `QAP_UPSTREAM_URL`.
//!
//! # Environment variables
//!
//! | Variable                        | Default          | Description                       |
//! |---------------------------------|------------------|-----------------------------------|
//! | `NATS_URL`                      | `localhost:4222` | NATS server address(es)           |
//! | `NATS_TOKEN`                    |                  | NATS token auth                   |
//! | `NATS_QUEUE_QAP`                |                  | QAP event subject                 |
//! | `NATS_QUEUE_ANALYTICS`          |                  | Analytics event subject           |
//! | `NATS_RECONNECT_WAIT_SECS`      | `10`             | Fixed wait between reconnects     |
//! | `NATS_CONNECT_TIMEOUT_SECS`     | `10`             | Per-attempt connect timeout       |
//! | `ENDPOINT_CHECK`                |                  | Access-check URL                  |
//! | `QAP_GATEWAY_PORT`              | `8080`           | TCP port to listen on             |
//! | `QAP_UPSTREAM_URL`              |                  | Upstream base URL                 |
//! | `QAP_UPSTREAM_TIMEOUT_SECS`     | `30`             | Upstream call timeout             |
//! | `QAP_ACCESS_CHECK_TIMEOUT_SECS` | `10`             | Access-check call timeout         |
//! | `QAP_MAX_BODY_BYTES`            | unlimited        | Largest buffered request body     |
//! | `QAP_GATEWAY_NAME`              | `unknown-gateway`| Value of `X-Api-Key`              |
//! | `QAP_ENDPOINT`                  |                  | Override reported in `X-API-Path` |
//! | `QAP_LOG_FORMAT`                | `text`           | `json` for JSON log lines         |
//! | `RUST_LOG`                      | `info`           | Log filter (tracing-subscriber)   |

use std::net::SocketAddr;
use std::sync::Arc;

use qap_gateway::{Capabilities, GatewayConfig, Interceptor, RouteConfig, server};
use qap_nats::connect;
use qap_std::{ReadEnv, SystemEnv};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging<E: ReadEnv>(env: &E) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env
        .non_blank("QAP_LOG_FORMAT")
        .is_some_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&SystemEnv);

    let config = GatewayConfig::from_env(&SystemEnv);
    let route = RouteConfig::from_env(&SystemEnv);

    if config.qap_subject().trim().is_empty() || config.analytics_subject().trim().is_empty() {
        warn!("NATS_QUEUE_QAP or NATS_QUEUE_ANALYTICS is unset; that channel drops events");
    }

    info!(
        servers = ?config.nats().servers,
        auth = config.nats().auth.description(),
        "Connecting to NATS"
    );
    let bus = match connect(config.nats()).await {
        Ok(client) => Some(client),
        Err(e) => {
            error!(error = %e, "NATS unavailable, continuing without event publishing");
            None
        }
    };

    let http = reqwest::Client::builder().build()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));

    info!(
        port = config.port(),
        gateway_name = route.gateway_name(),
        upstream = config.upstream_url().unwrap_or("<absolute-uri only>"),
        access_check = config.endpoint_check().is_some(),
        "QAP gateway starting"
    );

    let interceptor = Arc::new(Interceptor::new(
        Arc::new(config),
        route,
        Capabilities { bus, http },
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::serve(listener, interceptor, server::shutdown_signal()).await?;

    info!("QAP gateway stopped");
    Ok(())
}
