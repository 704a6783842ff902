use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::client::ApiRequest;
use crate::errors::Error;
use crate::refresh::{BoxFuture, PendingRequest, RefreshCoordinator, RefreshOutcome};
use crate::request::{ResponseClass, TokenMarkers, build_headers, classify, encode_payload};
use crate::session::{InvalidationReason, Session};
use crate::transport::{EncodedBody, OutboundRequest, Transport};
use crate::types::ApiResponse;

pub(crate) struct DispatchSettings {
    pub(crate) default_headers: HeaderMap,
    pub(crate) markers: TokenMarkers,
    pub(crate) max_replays: u8,
}

/// A call with its payload already encoded; replays only rebuild the headers.
#[derive(Clone)]
pub(crate) struct PreparedCall {
    label: String,
    method: Method,
    url: String,
    extra_headers: HeaderMap,
    body: EncodedBody,
    attach_auth: bool,
    token_override: Option<String>,
}

/// Shared context for outbound requests ensuring consistent token and refresh handling.
#[derive(Clone)]
pub(crate) struct DispatchContext {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    coordinator: Arc<RefreshCoordinator>,
    settings: Arc<DispatchSettings>,
}

impl DispatchContext {
    pub(crate) fn build(
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
        coordinator: Arc<RefreshCoordinator>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            transport,
            session,
            coordinator,
            settings: Arc::new(settings),
        }
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Encodes the payload and settles the content type. `url` must already be absolute.
    pub(crate) fn prepare(&self, request: ApiRequest, url: String) -> Result<PreparedCall, Error> {
        let label = format!("{} {}", request.method, request.url);
        let mut extra_headers = request.headers;
        let merged = build_headers(
            self.session.store().as_ref(),
            &self.settings.default_headers,
            &extra_headers,
            false,
            None,
        )?;
        let wants_json = merged
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        let encoded = encode_payload(&request.method, &request.body, wants_json)?;
        if let Some(content_type) = encoded.content_type
            && !merged.contains_key(CONTENT_TYPE)
        {
            extra_headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        Ok(PreparedCall {
            label,
            url: encoded.apply_query(&url),
            method: request.method,
            extra_headers,
            body: encoded.body,
            attach_auth: request.attach_auth,
            token_override: request.token_override,
        })
    }

    /// Runs one call to its terminal result. Boxed because replays re-enter it from the
    /// refresh task.
    pub(crate) fn execute(
        self,
        call: PreparedCall,
        replays: u8,
    ) -> BoxFuture<'static, Result<ApiResponse, Error>> {
        Box::pin(async move {
            let headers = build_headers(
                self.session.store().as_ref(),
                &self.settings.default_headers,
                &call.extra_headers,
                call.attach_auth,
                call.token_override.as_deref(),
            )?;
            let outbound = OutboundRequest {
                method: call.method.clone(),
                url: call.url.clone(),
                headers,
                body: call.body.clone(),
            };
            let raw = match self.transport.send(outbound).await {
                Ok(raw) => raw,
                Err(err) => {
                    error!("request unreachable: {} error={}", call.label, err);
                    return Err(err);
                }
            };

            let resp = ApiResponse::from_raw(raw);
            match classify(
                resp.status,
                &resp.status_text,
                resp.json.as_ref(),
                &self.settings.markers,
            ) {
                ResponseClass::Success => {
                    info!("request ok: {} status={}", call.label, resp.status);
                    Ok(resp)
                }
                ResponseClass::FormError => {
                    warn!("form validation failed: {} status={}", call.label, resp.status);
                    Err(Error::FormValidation(Box::new(resp)))
                }
                ResponseClass::ExpiredToken => {
                    warn!("access token expired: {} status={}", call.label, resp.status);
                    self.await_refresh(call, replays).await
                }
                ResponseClass::InvalidToken => {
                    warn!("access token rejected: {} status={}", call.label, resp.status);
                    self.coordinator
                        .invalidate_session(InvalidationReason::TokenRejected)
                        .await;
                    Err(Error::TokenInvalid(Box::new(resp)))
                }
                ResponseClass::TransportFailure => {
                    error!(
                        "request failed: {} status={} body='{}'",
                        call.label,
                        resp.status,
                        resp.text()
                    );
                    Err(Error::HttpFailure(Box::new(resp)))
                }
            }
        })
    }

    async fn await_refresh(&self, call: PreparedCall, replays: u8) -> Result<ApiResponse, Error> {
        if replays >= self.settings.max_replays {
            warn!(
                "still expired after {} replay(s), giving up: {}",
                replays, call.label
            );
            return Err(Error::TokenExpired);
        }

        let (tx, rx) = oneshot::channel();
        let context = self.clone();
        let label = call.label.clone();
        let pending = PendingRequest::new(label, move |outcome| match outcome {
            RefreshOutcome::Refreshed => {
                // the replay must pick up the refreshed token, not a per-call override
                let call = PreparedCall {
                    token_override: None,
                    ..call
                };
                tokio::spawn(async move {
                    let result = context.execute(call, replays + 1).await;
                    let _ = tx.send(result);
                });
            }
            RefreshOutcome::Failed => {
                let _ = tx.send(Err(Error::TokenExpired));
            }
        });
        self.coordinator.enqueue(pending).await;

        rx.await.unwrap_or(Err(Error::TokenExpired))
    }
}
