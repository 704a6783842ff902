use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::errors::Error;
use crate::refresh::RefreshCoordinator;
use crate::token::CredentialStore;
use crate::types::ApiResponse;

use super::{ApiClient, ApiClientBuilder, ApiRequest, DownloadedFile, ResponseHandlers};

impl ApiClient {
    /// Client with the default reqwest transport and an in-memory (or `token_file`) store.
    pub fn new(config: Config) -> Result<Self, Error> {
        ApiClientBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(self.context.session().store())
    }

    pub fn refresh_coordinator(&self) -> Arc<RefreshCoordinator> {
        Arc::clone(self.context.coordinator())
    }

    /// Sends `request` and resolves once it has a terminal outcome. An expired token is repaired
    /// by a refresh and the call replayed before this returns.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let url = self.config.resolve_url(&request.url);
        let call = self.context.prepare(request, url)?;
        self.context.clone().execute(call, 0).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        self.send(request).await?.parse()
    }

    /// Fire-and-continue variant of [`send`](Self::send): the outcome goes to `handlers`.
    pub fn dispatch(&self, request: ApiRequest, handlers: ResponseHandlers) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.send(request).await;
            handlers.deliver(result);
        })
    }

    /// Like [`send`](Self::send), but hands back the raw bytes and file metadata.
    pub async fn download(&self, request: ApiRequest) -> Result<DownloadedFile, Error> {
        let resp = self.send(request).await?;
        Ok(DownloadedFile::from_response(resp))
    }
}
