//! Single-flight credential refresh.
//!
//! The first caller that observes an expired token starts a refresh episode; every caller that
//! observes one while the episode is running is queued behind it and resumed, in order, when
//! the episode ends.

mod coordinator;
mod pending;
mod source;

pub use coordinator::RefreshCoordinator;
pub use pending::{PendingRequest, RefreshOutcome};
pub use source::{BoxFuture, RefreshFn, RefreshKeys, RefreshMethod, RefreshTokenLookup, Refresher};
