use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Access/refresh token pair. Empty strings count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
        }
    }

    pub fn access(&self) -> Option<&str> {
        non_empty(self.access_token.as_deref())
    }

    pub fn refresh(&self) -> Option<&str> {
        non_empty(self.refresh_token.as_deref())
    }

    /// Applies a refresh result. A refresh response that omits the refresh token keeps the
    /// current one.
    pub fn merged(&self, update: TokenPair) -> TokenPair {
        TokenPair {
            access_token: update.access().map(str::to_string),
            refresh_token: update
                .refresh()
                .or_else(|| self.refresh())
                .map(str::to_string),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Holds the current credential. Writers replace the whole pair at once, so readers never see
/// an access token from one refresh next to a refresh token from another.
pub trait CredentialStore: Send + Sync {
    fn tokens(&self) -> TokenPair;

    fn set_tokens(&self, tokens: TokenPair);

    fn clear(&self);

    fn access_token(&self) -> Option<String> {
        self.tokens().access().map(str::to_string)
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens().refresh().map(str::to_string)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<TokenPair>,
}

impl MemoryCredentialStore {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn tokens(&self) -> TokenPair {
        self.tokens.read().clone()
    }

    fn set_tokens(&self, tokens: TokenPair) {
        *self.tokens.write() = tokens;
    }

    fn clear(&self) {
        *self.tokens.write() = TokenPair::default();
    }
}
