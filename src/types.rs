use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::errors::Error;
use crate::transport::RawResponse;

/// A completed response with its body decoded as JSON when possible.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub json: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn from_raw(raw: RawResponse) -> Self {
        // undecodable bodies are treated as absent
        let json = if raw.body.is_empty() {
            None
        } else {
            serde_json::from_slice(&raw.body).ok()
        };
        Self {
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            body: raw.body,
            json,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
