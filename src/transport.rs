//! The network primitive the dispatcher sits on top of.

use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::errors::Error;
use crate::request::payload::{MultipartPayload, PartValue};

/// Body as it goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    Empty,
    Text(String),
    Multipart(MultipartPayload),
}

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: EncodedBody,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Performs one network call. Implementations report "no response at all" as
/// `Error::TransportUnreachable`; every answered request is `Ok`, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, Error>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, Error> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = request;
        debug!("transport send: method={} url='{}'", method, url);
        let mut builder = self.client.request(method, &url).headers(headers);
        builder = match body {
            EncodedBody::Empty => builder,
            EncodedBody::Text(text) => builder.body(text),
            EncodedBody::Multipart(payload) => builder.multipart(into_form(payload)?),
        };
        let resp = builder.send().await?;

        let status = resp.status();
        // hyper keeps non-standard reason phrases as an extension; standard ones are dropped
        let status_text = match resp.extensions().get::<ReasonPhrase>() {
            Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
            None => status.canonical_reason().unwrap_or_default().to_string(),
        };
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

fn into_form(payload: MultipartPayload) -> Result<reqwest::multipart::Form, Error> {
    let mut form = reqwest::multipart::Form::new();
    for part in payload.parts {
        form = match part.value {
            PartValue::Text(text) => form.text(part.name, text),
            PartValue::File {
                bytes,
                file_name,
                mime,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime {
                    file = file
                        .mime_str(&mime)
                        .map_err(|e| Error::Payload(format!("invalid mime type '{mime}': {e}")))?;
                }
                form.part(part.name, file)
            }
        };
    }
    Ok(form)
}
