mod common;

use std::time::Duration;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bearer_session::{ApiRequest, TokenPair};
use common::{EXPIRED_BODY, client_for};

async fn mount_refresh(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/token/refresh"))
        .and(body_json(serde_json::json!({ "refresh_token": "R1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "token": "T2", "refresh_token": "R2" }))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_resource(server: &MockServer, resource: &str) {
    Mock::given(method("GET"))
        .and(path(resource))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401).set_body_string(EXPIRED_BODY))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource))
        .and(header("authorization", "Bearer T2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "resource": resource })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_expired_calls_trigger_one_refresh() {
    let server = MockServer::start().await;
    mount_refresh(&server, Duration::from_millis(50)).await;
    mount_resource(&server, "/orders").await;
    mount_resource(&server, "/invoices").await;

    let client = client_for(&server, "expired-concurrent").await;
    let (orders, invoices) = tokio::join!(
        client.send(ApiRequest::get("/orders")),
        client.send(ApiRequest::get("/invoices")),
    );

    let orders = orders.expect("orders replayed");
    let invoices = invoices.expect("invoices replayed");
    assert_eq!(orders.json.unwrap()["resource"], "/orders");
    assert_eq!(invoices.json.unwrap()["resource"], "/invoices");
    assert_eq!(
        client.credentials().tokens(),
        TokenPair::new("T2", Some("R2".into()))
    );
    assert_eq!(client.refresh_coordinator().episodes(), 1);

    let refresh_calls: Vec<_> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/token/refresh")
        .collect();
    assert_eq!(refresh_calls.len(), 1);
    assert!(
        !refresh_calls[0].headers.contains_key("authorization"),
        "refresh call must not carry the expired token"
    );
}

#[tokio::test]
async fn late_call_joins_refresh_in_flight() {
    let server = MockServer::start().await;
    mount_refresh(&server, Duration::from_millis(300)).await;
    mount_resource(&server, "/orders").await;
    mount_resource(&server, "/invoices").await;

    let client = client_for(&server, "expired-late").await;
    let late = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.send(ApiRequest::get("/invoices")).await
    };
    let (orders, invoices) = tokio::join!(client.send(ApiRequest::get("/orders")), late);

    orders.expect("orders replayed");
    invoices.expect("invoices replayed");
    assert_eq!(client.refresh_coordinator().episodes(), 1);
}

#[tokio::test]
async fn call_after_refresh_uses_new_token_directly() {
    let server = MockServer::start().await;
    mount_refresh(&server, Duration::ZERO).await;
    mount_resource(&server, "/orders").await;
    mount_resource(&server, "/invoices").await;

    let client = client_for(&server, "expired-after").await;
    client.send(ApiRequest::get("/orders")).await.unwrap();
    client.send(ApiRequest::get("/invoices")).await.unwrap();

    let invoices: Vec<_> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/invoices")
        .collect();
    assert_eq!(invoices.len(), 1);
    assert_eq!(
        invoices[0].headers.get("authorization").unwrap(),
        "Bearer T2"
    );
}
