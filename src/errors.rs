use crate::types::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No response was received at all (DNS, connect, reset, ...).
    #[error("transport unreachable: {0}")]
    TransportUnreachable(String),
    #[error("form validation failed with status {}", .0.status)]
    FormValidation(Box<ApiResponse>),
    /// The access token expired and the session could not be refreshed.
    #[error("access token expired and could not be refreshed")]
    TokenExpired,
    #[error("access token rejected with status {}", .0.status)]
    TokenInvalid(Box<ApiResponse>),
    #[error("request failed with status {}", .0.status)]
    HttpFailure(Box<ApiResponse>),
    #[error("refresh failed: {0}")]
    Refresh(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid header: {0}")]
    Header(String),
    #[error("payload error: {0}")]
    Payload(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The response attached to this error, if the server answered at all.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Error::FormValidation(resp) | Error::TokenInvalid(resp) | Error::HttpFailure(resp) => {
                Some(resp)
            }
            _ => None,
        }
    }

    /// Whether this error means the session was torn down.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Error::TokenExpired | Error::TokenInvalid(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::Config(format!("invalid request: {err}"))
        } else {
            Error::TransportUnreachable(err.to_string())
        }
    }
}
