mod common;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bearer_session::{ApiClient, ApiRequest, CredentialStore, FileCredentialStore};
use common::{EXPIRED_BODY, client_for, init_logging, load_config};

#[tokio::test]
async fn download_returns_bytes_and_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/q3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"report.csv\"; filename*=UTF-8''r%C3%A9sum%C3%A9.csv",
                )
                .set_body_bytes(b"a,b\n1,2\n".to_vec()),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, "download").await;
    let file = client.download(ApiRequest::get("/reports/q3")).await.unwrap();
    assert_eq!(file.bytes, b"a,b\n1,2\n");
    assert_eq!(file.content_type.as_deref(), Some("text/csv"));
    assert_eq!(file.file_name.as_deref(), Some("résumé.csv"));
}

#[tokio::test]
async fn refreshed_tokens_are_persisted_to_token_file() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "T2" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401).set_body_string(EXPIRED_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("session.json");
    let config = load_config(
        &server,
        "download-persist",
        serde_json::json!({ "token_file": token_file.to_string_lossy() }),
    )
    .await;
    let client = ApiClient::new(config).unwrap();

    let file = client.download(ApiRequest::get("/invoices/1.pdf")).await.unwrap();
    assert_eq!(file.bytes, b"pdf");

    let reopened = FileCredentialStore::open(&token_file).unwrap();
    assert_eq!(reopened.access_token().as_deref(), Some("T2"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
}
