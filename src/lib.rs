//! Bearer-token HTTP access layer with single-flight token refresh.
//!
//! Every call attaches the current access token. A response that says the token expired parks
//! the call behind one shared refresh; once the refresh lands, parked calls are replayed in the
//! order they were parked. A rejected token or a failed refresh tears the session down.

pub mod client;
pub mod config;
pub mod errors;
pub mod refresh;
pub mod request;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod transport;

mod request_context;
mod types;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest, DownloadedFile, ResponseHandlers};
pub use config::{Config, ConfigLocation};
pub use errors::Error;
pub use request::{FieldMap, MultipartPayload, PayloadValue, RequestBody, ResponseClass};
pub use session::{InvalidationReason, SessionHooks};
pub use token::{CredentialStore, FileCredentialStore, MemoryCredentialStore, TokenPair};
pub use types::ApiResponse;
