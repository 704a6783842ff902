use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::errors::Error;
use crate::refresh::{
    BoxFuture, RefreshCoordinator, RefreshFn, RefreshMethod, RefreshTokenLookup, Refresher,
};
use crate::request_context::{DispatchContext, DispatchSettings};
use crate::session::{NoopHooks, Session, SessionHooks};
use crate::token::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
use crate::transport::{ReqwestTransport, Transport};

use super::ApiClient;

/// Wires an [`ApiClient`] from a [`Config`] plus optional collaborators.
pub struct ApiClientBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    hooks: Option<Arc<dyn SessionHooks>>,
    refresh: Option<RefreshMethod>,
    refresh_token_lookup: Option<RefreshTokenLookup>,
}

impl ApiClientBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            hooks: None,
            refresh: None,
            refresh_token_lookup: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Replaces the refresh endpoint with a caller-supplied refresh.
    pub fn refresh_with<F>(mut self, refresh: F) -> Self
    where
        F: Fn(Option<String>) -> BoxFuture<'static, Result<TokenPair, Error>>
            + Send
            + Sync
            + 'static,
    {
        let refresh: RefreshFn = Arc::new(refresh);
        self.refresh = Some(RefreshMethod::Custom(refresh));
        self
    }

    /// Reads the refresh token from `lookup` instead of the credential store.
    pub fn refresh_token_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.refresh_token_lookup = Some(Arc::new(lookup));
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        let config = self.config;
        config.validate()?;
        let default_headers = config.header_map()?;

        let store: Arc<dyn CredentialStore> = match (self.store, &config.token_file) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileCredentialStore::open(path)?),
            (None, None) => Arc::new(MemoryCredentialStore::default()),
        };
        if store.access_token().is_none()
            && let Some(access) = config.access_token.as_ref().filter(|t| !t.is_empty())
        {
            info!("seeding credential store from configuration");
            store.set_tokens(TokenPair::new(access.clone(), config.refresh_token.clone()));
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::default()));
        let hooks = self.hooks.unwrap_or_else(|| Arc::new(NoopHooks));
        let method = self.refresh.or_else(|| {
            config
                .refresh_url
                .as_ref()
                .map(|url| RefreshMethod::Endpoint(config.resolve_url(url)))
        });

        let session = Arc::new(Session::new(
            Arc::clone(&store),
            hooks,
            config.logout_redirect.clone(),
        ));
        let refresher = Refresher::new(
            method,
            Arc::clone(&transport),
            store,
            self.refresh_token_lookup,
            config.refresh_keys.clone(),
            default_headers.clone(),
        );
        let coordinator = Arc::new(RefreshCoordinator::new(refresher, Arc::clone(&session)));
        let context = DispatchContext::build(
            transport,
            session,
            coordinator,
            DispatchSettings {
                default_headers,
                markers: config.markers.clone(),
                max_replays: config.max_replays,
            },
        );
        Ok(ApiClient {
            config: Arc::new(config),
            context,
        })
    }
}
