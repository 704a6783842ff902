use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::errors::Error;
use crate::token::CredentialStore;

/// Assembles the header set for one request.
///
/// `defaults` are applied first and `extra` overrides them key by key. With `attach_auth`, the
/// token is `token_override` when given, else the store's current access token; an empty
/// resolution adds no `Authorization` header.
pub fn build_headers(
    store: &dyn CredentialStore,
    defaults: &HeaderMap,
    extra: &HeaderMap,
    attach_auth: bool,
    token_override: Option<&str>,
) -> Result<HeaderMap, Error> {
    let mut headers = defaults.clone();
    for name in extra.keys() {
        headers.remove(name);
    }
    for (name, value) in extra {
        headers.append(name.clone(), value.clone());
    }

    if attach_auth {
        let token = match token_override {
            Some(token) => Some(token.to_string()),
            None => store.access_token(),
        };
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::Header(format!("bearer token is not a valid header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
    }
    Ok(headers)
}
