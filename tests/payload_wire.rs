mod common;

use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bearer_session::{ApiClient, ApiRequest, Error, FieldMap, MultipartPayload, PayloadValue};
use common::{client_for, init_logging, load_config};

fn filter() -> FieldMap {
    FieldMap::new()
        .with("status", "open")
        .with("ids", vec![3_i64, 5])
        .with("paid", true)
        .with("note", PayloadValue::Null)
}

#[tokio::test]
async fn get_fields_become_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(query_param("status", "open"))
        .and(query_param("ids[0]", "3"))
        .and(query_param("ids[1]", "5"))
        .and(query_param("paid", "1"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "wire-query").await;
    client
        .send(ApiRequest::get("/orders").body(filter()))
        .await
        .expect("query matched");
}

#[tokio::test]
async fn json_content_type_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({ "sku": "A-1", "qty": 2 })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":9}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "wire-json").await;
    #[derive(serde::Deserialize)]
    struct Created {
        id: u64,
    }
    let created: Created = client
        .send_json(ApiRequest::post("/orders").json(serde_json::json!({ "sku": "A-1", "qty": 2 })))
        .await
        .unwrap();
    assert_eq!(created.id, 9);
}

#[tokio::test]
async fn patch_fields_are_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/orders/9"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("status=shipped&paid=0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "wire-patch").await;
    client
        .send(
            ApiRequest::patch("/orders/9")
                .body(FieldMap::new().with("status", "shipped").with("paid", false)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn post_fields_go_out_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = client_for(&server, "wire-multipart").await;
    client
        .send(
            ApiRequest::post("/uploads").body(
                MultipartPayload::new()
                    .text("title", "Q3 report")
                    .file(
                        "doc",
                        "q3.pdf",
                        b"%PDF-1.4".to_vec(),
                        Some("application/pdf".into()),
                    ),
            ),
        )
        .await
        .unwrap();

    let reqs = server.received_requests().await.unwrap_or_default();
    let content_type = reqs[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&reqs[0].body);
    assert!(body.contains(r#"name="title""#));
    assert!(body.contains("Q3 report"));
    assert!(body.contains(r#"filename="q3.pdf""#));
}

#[tokio::test]
async fn default_headers_are_sent_and_overridable() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-tenant", "acme"))
        .and(header("accept-language", "de"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = load_config(
        &server,
        "wire-headers",
        serde_json::json!({
            "default_headers": { "x-tenant": "acme", "accept-language": "en" }
        }),
    )
    .await;
    let client = ApiClient::new(config).unwrap();
    client
        .send(
            ApiRequest::get("/me")
                .try_header("accept-language", "de")
                .unwrap(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn multipart_on_get_is_rejected_before_sending() {
    let server = MockServer::start().await;
    let client = client_for(&server, "wire-reject").await;
    let err = client
        .send(ApiRequest::get("/orders").body(MultipartPayload::new().text("a", "b")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Payload(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
