use reqwest::StatusCode;
use serde::Deserialize;

/// What a completed response means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    FormError,
    ExpiredToken,
    InvalidToken,
    TransportFailure,
}

/// Server vocabulary used to recognise token problems on a 401.
///
/// Expired markers are checked before invalid markers; the two sets are expected to be disjoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenMarkers {
    pub expired_status_texts: Vec<String>,
    pub expired_codes: Vec<String>,
    pub invalid_status_texts: Vec<String>,
    pub invalid_codes: Vec<String>,
    /// Top-level body fields whose string value is compared against the code lists.
    pub code_fields: Vec<String>,
}

impl Default for TokenMarkers {
    fn default() -> Self {
        Self {
            expired_status_texts: vec!["Expired JWT Token".into()],
            expired_codes: vec!["Expired JWT Token".into(), "token_expired".into()],
            invalid_status_texts: vec!["Invalid JWT Token".into(), "JWT Token not found".into()],
            invalid_codes: vec![
                "Invalid JWT Token".into(),
                "JWT Token not found".into(),
                "invalid_token".into(),
            ],
            code_fields: vec!["message".into(), "code".into(), "error".into()],
        }
    }
}

impl TokenMarkers {
    fn body_matches(&self, body: Option<&serde_json::Value>, codes: &[String]) -> bool {
        let Some(body) = body else {
            return false;
        };
        self.code_fields.iter().any(|field| {
            body.get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|code| codes.iter().any(|c| c == code))
        })
    }

    fn is_expired(&self, status_text: &str, body: Option<&serde_json::Value>) -> bool {
        self.expired_status_texts.iter().any(|t| t == status_text)
            || self.body_matches(body, &self.expired_codes)
    }

    fn is_invalid(&self, status_text: &str, body: Option<&serde_json::Value>) -> bool {
        self.invalid_status_texts.iter().any(|t| t == status_text)
            || self.body_matches(body, &self.invalid_codes)
    }
}

/// Classifies a completed response. Pure; `body` is the decoded JSON body, `None` when the body
/// was empty or could not be decoded.
pub fn classify(
    status: StatusCode,
    status_text: &str,
    body: Option<&serde_json::Value>,
    markers: &TokenMarkers,
) -> ResponseClass {
    if status.is_success() {
        return ResponseClass::Success;
    }
    match status {
        StatusCode::BAD_REQUEST => match body {
            Some(v) if v.is_object() || v.is_array() => ResponseClass::FormError,
            _ => ResponseClass::TransportFailure,
        },
        StatusCode::UNAUTHORIZED if markers.is_expired(status_text, body) => {
            ResponseClass::ExpiredToken
        }
        StatusCode::UNAUTHORIZED if markers.is_invalid(status_text, body) => {
            ResponseClass::InvalidToken
        }
        _ => ResponseClass::TransportFailure,
    }
}
