use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use qap_nats::{ConnectionStatus, PublishClient};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::interceptor::Interceptor;

/// Every method and path goes through the interceptor.
pub fn router<N>(interceptor: Arc<Interceptor<N>>) -> Router
where
    N: PublishClient + ConnectionStatus,
{
    Router::new()
        .fallback(intercept::<N>)
        .with_state(interceptor)
}

async fn intercept<N>(State(interceptor): State<Arc<Interceptor<N>>>, request: Request) -> Response
where
    N: PublishClient + ConnectionStatus,
{
    interceptor.handle(request).await
}

/// Serves until `shutdown` resolves, then stops accepting connections and
/// lets in-flight exchanges run to completion.
pub async fn serve<N, F>(
    listener: TcpListener,
    interceptor: Arc<Interceptor<N>>,
    shutdown: F,
) -> std::io::Result<()>
where
    N: PublishClient + ConnectionStatus,
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "QAP gateway listening");
    }

    axum::serve(listener, router(interceptor))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("No longer accepting connections, draining in-flight exchanges");
        })
        .await?;

    info!("All exchanges drained");
    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let signal = termination().await;
    info!(signal, "QAP gateway shutdown requested");
}

#[cfg(unix)]
async fn termination() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            name = interrupt() => name,
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, only SIGINT stops the gateway");
            interrupt().await
        }
    }
}

#[cfg(not(unix))]
async fn termination() -> &'static str {
    interrupt().await
}

async fn interrupt() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "SIGINT handler unavailable");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, RouteConfig};
    use crate::interceptor::Capabilities;
    use axum::body::Body;
    use axum::http::StatusCode;
    use httpmock::MockServer;
    use qap_nats::{MockNatsClient, NatsConfig};
    use tower::ServiceExt;

    #[tokio::test]
    async fn any_method_and_path_reaches_the_interceptor() {
        let upstream = MockServer::start_async().await;
        let deep = upstream
            .mock_async(|when, then| {
                when.method(httpmock::Method::DELETE).path("/a/b/c");
                then.status(204);
            })
            .await;

        let config = GatewayConfig::new(NatsConfig::from_url("localhost:4222"), "q", "a")
            .with_upstream_url(upstream.base_url());
        let interceptor = Arc::new(Interceptor::new(
            Arc::new(config),
            RouteConfig::default(),
            Capabilities::<MockNatsClient> {
                bus: None,
                http: reqwest::Client::new(),
            },
        ));

        let response = router(interceptor)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/a/b/c")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        deep.assert_async().await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get("x-api-path").unwrap(), "/a/b/c");
    }

    #[tokio::test]
    async fn serve_returns_once_shutdown_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = GatewayConfig::new(NatsConfig::from_url("localhost:4222"), "q", "a");
        let interceptor = Arc::new(Interceptor::new(
            Arc::new(config),
            RouteConfig::default(),
            Capabilities::<MockNatsClient> {
                bus: None,
                http: reqwest::Client::new(),
            },
        ));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, interceptor, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
