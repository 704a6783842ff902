use std::fmt;

/// How a refresh episode ended, as seen by a waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed,
}

/// A call that hit an expired token, parked until the running refresh episode ends.
///
/// The continuation is consumed exactly once: it replays the call after a successful refresh,
/// or fails it after a failed one.
pub struct PendingRequest {
    label: String,
    resume: Box<dyn FnOnce(RefreshOutcome) + Send>,
}

impl PendingRequest {
    pub fn new(
        label: impl Into<String>,
        resume: impl FnOnce(RefreshOutcome) + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            resume: Box::new(resume),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn resume(self, outcome: RefreshOutcome) {
        (self.resume)(outcome)
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
