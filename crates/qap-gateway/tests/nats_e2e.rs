//! Publishes through a real NATS server.
//!
//! Requires Docker (uses testcontainers to start NATS). Run with:
//!   cargo test -p qap-gateway --test nats_e2e -- --ignored

use std::sync::Arc;
use std::time::Duration;

use async_nats::connection::State;
use futures_util::StreamExt;
use qap_gateway::{
    Capabilities, EventKind, EventRecord, GatewayConfig, Interceptor, RouteConfig, server,
};
use qap_nats::{NatsConfig, connect};
use testcontainers_modules::nats::Nats;
use testcontainers_modules::testcontainers::ContainerAsync;
use testcontainers_modules::testcontainers::runners::AsyncRunner;

async fn start_nats() -> (ContainerAsync<Nats>, u16) {
    let container = Nats::default()
        .start()
        .await
        .expect("Failed to start NATS container, is Docker running?");
    let port = container.get_host_port_ipv4(4222).await.unwrap();
    (container, port)
}

async fn wait_until_connected(client: &async_nats::Client) {
    for _ in 0..100 {
        if matches!(client.connection_state(), State::Connected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("NATS client never connected");
}

async fn next_event(sub: &mut async_nats::Subscriber) -> EventRecord {
    let msg = tokio::time::timeout(Duration::from_secs(5), sub.next())
        .await
        .expect("timed out waiting for event")
        .expect("subscription closed");
    serde_json::from_slice(&msg.payload).unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn request_and_response_events_reach_both_subjects() {
    let (_container, port) = start_nats().await;
    let nats_config = NatsConfig::from_url(format!("127.0.0.1:{port}"))
        .with_reconnect_wait(Duration::from_millis(100));

    let publisher = connect(&nats_config).await.unwrap();
    wait_until_connected(&publisher).await;

    let subscriber = async_nats::connect(format!("127.0.0.1:{port}")).await.unwrap();
    let mut qap = subscriber.subscribe("qap.e2e").await.unwrap();
    let mut analytics = subscriber.subscribe("analytics.e2e").await.unwrap();
    subscriber.flush().await.unwrap();

    let upstream = httpmock::MockServer::start_async().await;
    upstream
        .mock_async(|when, then| {
            when.method(httpmock::Method::PUT).path("/profile");
            then.status(200).body("saved");
        })
        .await;

    let config = GatewayConfig::new(nats_config, "qap.e2e", "analytics.e2e")
        .with_upstream_url(upstream.base_url());
    let interceptor = Arc::new(Interceptor::new(
        Arc::new(config),
        RouteConfig::new("e2e"),
        Capabilities {
            bus: Some(publisher),
            http: reqwest::Client::new(),
        },
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(server::serve(listener, interceptor, std::future::pending()));

    let response = reqwest::Client::new()
        .put(format!("http://{addr}/profile"))
        .body("name=ana")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let mut qap_kinds = Vec::new();
    let mut analytics_kinds = Vec::new();
    for _ in 0..2 {
        let event = next_event(&mut qap).await;
        assert_eq!(event.path, "/profile");
        assert_eq!(event.method, "PUT");
        qap_kinds.push(event.kind);
        analytics_kinds.push(next_event(&mut analytics).await.kind);
    }

    assert_eq!(qap_kinds, vec![EventKind::Request, EventKind::Response]);
    assert_eq!(analytics_kinds, vec![EventKind::Request, EventKind::Response]);

    server.abort();
}
