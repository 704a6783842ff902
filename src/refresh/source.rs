use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::errors::Error;
use crate::request::payload::JSON_CONTENT_TYPE;
use crate::request::{FieldMap, RequestBody, build_headers, encode_payload};
use crate::token::{CredentialStore, TokenPair};
use crate::transport::{OutboundRequest, Transport};
use crate::types::ApiResponse;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Caller-supplied refresh: receives the current refresh token and yields the new pair.
pub type RefreshFn =
    Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<TokenPair, Error>> + Send + Sync>;

/// Caller-supplied lookup of the refresh token, used instead of the credential store.
pub type RefreshTokenLookup = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum RefreshMethod {
    /// POST the refresh token as JSON to this URL.
    Endpoint(String),
    Custom(RefreshFn),
}

impl std::fmt::Debug for RefreshMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshMethod::Endpoint(url) => f.debug_tuple("Endpoint").field(url).finish(),
            RefreshMethod::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Field names used on the refresh endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefreshKeys {
    /// Request field carrying the refresh token.
    pub request_key: String,
    /// Response field carrying the new access token.
    pub access_key: String,
    /// Response field carrying the new refresh token.
    pub refresh_key: String,
}

impl Default for RefreshKeys {
    fn default() -> Self {
        Self {
            request_key: "refresh_token".into(),
            access_key: "token".into(),
            refresh_key: "refresh_token".into(),
        }
    }
}

/// Performs the refresh call itself. Never attaches the (expired) access token.
pub struct Refresher {
    method: Option<RefreshMethod>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    lookup: Option<RefreshTokenLookup>,
    keys: RefreshKeys,
    default_headers: HeaderMap,
}

impl Refresher {
    pub fn new(
        method: Option<RefreshMethod>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        lookup: Option<RefreshTokenLookup>,
        keys: RefreshKeys,
        default_headers: HeaderMap,
    ) -> Self {
        Self {
            method,
            transport,
            store,
            lookup,
            keys,
            default_headers,
        }
    }

    pub async fn refresh(&self) -> Result<TokenPair, Error> {
        let refresh_token = match &self.lookup {
            Some(lookup) => lookup(),
            None => self.store.refresh_token(),
        }
        .filter(|t| !t.is_empty());

        match &self.method {
            None => Err(Error::Refresh("no refresh method configured".into())),
            Some(RefreshMethod::Custom(refresh)) => refresh(refresh_token).await,
            Some(RefreshMethod::Endpoint(url)) => {
                let token = refresh_token
                    .ok_or_else(|| Error::Refresh("no refresh token available".into()))?;
                self.call_endpoint(url, token).await
            }
        }
    }

    async fn call_endpoint(&self, url: &str, refresh_token: String) -> Result<TokenPair, Error> {
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let headers = build_headers(
            self.store.as_ref(),
            &self.default_headers,
            &extra,
            false,
            None,
        )?;
        let body = RequestBody::Fields(
            FieldMap::new().with(self.keys.request_key.clone(), refresh_token),
        );
        let encoded = encode_payload(&Method::POST, &body, true)?;

        debug!("refresh call: url='{}'", url);
        let raw = self
            .transport
            .send(OutboundRequest {
                method: Method::POST,
                url: url.to_string(),
                headers,
                body: encoded.body,
            })
            .await?;
        let resp = ApiResponse::from_raw(raw);
        if !resp.status.is_success() {
            return Err(Error::Refresh(format!(
                "refresh endpoint returned {}: {}",
                resp.status,
                resp.text()
            )));
        }
        self.read_tokens(&resp)
    }

    fn read_tokens(&self, resp: &ApiResponse) -> Result<TokenPair, Error> {
        let json = resp
            .json
            .as_ref()
            .ok_or_else(|| Error::Refresh("refresh response is not JSON".into()))?;
        let field = |key: &str| {
            json.get(key)
                .and_then(|v| v.as_str())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let access = field(&self.keys.access_key).ok_or_else(|| {
            Error::Refresh(format!(
                "refresh response has no '{}' field",
                self.keys.access_key
            ))
        })?;
        Ok(TokenPair {
            access_token: Some(access),
            refresh_token: field(&self.keys.refresh_key),
        })
    }
}
