#![allow(dead_code)]

pub mod raw_http;

use std::fs;
use std::path::PathBuf;
use std::sync::Once;

use wiremock::MockServer;

use bearer_session::{ApiClient, Config, ConfigLocation};

pub const EXPIRED_BODY: &str = r#"{"code":401,"message":"Expired JWT Token"}"#;
pub const INVALID_BODY: &str = r#"{"code":401,"message":"JWT Token not found"}"#;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Writes a per-test config file pointing at `server` and loads it the way an application would.
pub async fn load_config(server: &MockServer, name: &str, extra: serde_json::Value) -> Config {
    let mut cfg = serde_json::json!({
        "base_url": server.uri(),
        "refresh_url": "/token/refresh",
        "access_token": "T1",
        "refresh_token": "R1",
    });
    if let (Some(cfg), Some(extra)) = (cfg.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            cfg.insert(key.clone(), value.clone());
        }
    }
    let mut cfg_path = PathBuf::from("target");
    cfg_path.push(format!("test-config-{}-{}.json", name, server.address().port()));
    fs::create_dir_all("target").ok();
    fs::write(&cfg_path, serde_json::to_string(&cfg).unwrap()).unwrap();

    Config::load(ConfigLocation::File(cfg_path.to_string_lossy().to_string()))
        .await
        .expect("config loads")
}

pub async fn client_for(server: &MockServer, name: &str) -> ApiClient {
    init_logging();
    let config = load_config(server, name, serde_json::json!({})).await;
    ApiClient::new(config).expect("client new failed")
}
