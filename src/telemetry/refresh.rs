use jiff::Timestamp;
use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;

/// Structured events for one refresh episode.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    episode_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            episode_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn episode_id(&self) -> Uuid {
        self.episode_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self) {
        event!(
            Level::INFO,
            episode_id = %self.episode_id,
            context = %self.context,
            timestamp = %Timestamp::now(),
            "refresh.start"
        );
    }

    pub fn emit_enqueued(&self, request: &str, position: usize) {
        event!(
            Level::DEBUG,
            episode_id = %self.episode_id,
            request = %request,
            position,
            "refresh.enqueued"
        );
    }

    pub fn emit_success(&self, waiters: usize) {
        event!(
            Level::INFO,
            episode_id = %self.episode_id,
            context = %self.context,
            timestamp = %Timestamp::now(),
            waiters,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &Error, waiters: usize) {
        event!(
            Level::ERROR,
            episode_id = %self.episode_id,
            context = %self.context,
            timestamp = %Timestamp::now(),
            error = %error,
            waiters,
            "refresh.failure"
        );
    }
}
