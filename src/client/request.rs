use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::errors::Error;
use crate::request::RequestBody;
use crate::request::payload::JSON_CONTENT_TYPE;

/// One logical API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute, or relative to the configured base URL.
    pub url: String,
    pub body: RequestBody,
    pub headers: HeaderMap,
    pub attach_auth: bool,
    /// Token to use instead of the stored one, for this call only.
    pub token_override: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
            attach_auth: true,
            token_override: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Sends `value` as a JSON body (or as query fields on read methods).
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::json(value);
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Header(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Header(format!("invalid value for '{name}': {e}")))?;
        Ok(self.header(name, value))
    }

    pub fn without_auth(mut self) -> Self {
        self.attach_auth = false;
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.token_override = Some(token.into());
        self
    }
}
