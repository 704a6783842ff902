use tracing::{debug, error};

use crate::errors::Error;
use crate::types::ApiResponse;

type ResponseHandler = Box<dyn FnOnce(ApiResponse) + Send>;
type ErrorHandler = Box<dyn FnOnce(Error) + Send>;

/// Callbacks for [`ApiClient::dispatch`](super::ApiClient::dispatch). At most one of them runs
/// per call.
#[derive(Default)]
pub struct ResponseHandlers {
    on_success: Option<ResponseHandler>,
    on_error: Option<ErrorHandler>,
    on_form_error: Option<ResponseHandler>,
}

impl ResponseHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, handler: impl FnOnce(ApiResponse) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnOnce(Error) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Receives 400 responses with a structured body. Without it they go to `on_error`.
    pub fn on_form_error(mut self, handler: impl FnOnce(ApiResponse) + Send + 'static) -> Self {
        self.on_form_error = Some(Box::new(handler));
        self
    }

    pub(crate) fn deliver(self, result: Result<ApiResponse, Error>) {
        match result {
            Ok(resp) => match self.on_success {
                Some(handler) => handler(resp),
                None => debug!("no success handler for status {}", resp.status),
            },
            Err(Error::FormValidation(resp)) => match self.on_form_error {
                Some(handler) => handler(*resp),
                None => {
                    error!(
                        "form validation failed: status={} body='{}'",
                        resp.status,
                        resp.text()
                    );
                    if let Some(handler) = self.on_error {
                        handler(Error::FormValidation(resp));
                    }
                }
            },
            Err(err) => match self.on_error {
                Some(handler) => handler(err),
                None => debug!("no error handler for: {}", err),
            },
        }
    }
}
