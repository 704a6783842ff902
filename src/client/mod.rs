use std::sync::Arc;

mod builder;
mod download;
mod handlers;
mod impls;
mod request;

pub use builder::ApiClientBuilder;
pub use download::{DownloadedFile, parse_content_disposition};
pub use handlers::ResponseHandlers;
pub use request::ApiRequest;

use crate::config::Config;
use crate::request_context::DispatchContext;

/// Authenticated API client. Cheap to clone; clones share one credential store and one refresh
/// coordinator.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<Config>,
    context: DispatchContext,
}
