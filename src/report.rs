//! Error-surfacing collaborator
//!
//! The console surfaces failures to the operator through a toaster-style
//! reporter. This crate only depends on the seam; hosts install their own
//! implementation, tests install counters.

use crate::error::ClientError;

/// Generic error-reporting collaborator
///
/// Invoked for every failure that should be visible to the operator.
/// Authorization-gate responses (401/403) on collection loads bypass the
/// reporter entirely.
pub trait ErrorReporter: Send + Sync {
    fn on_http_error(&self, error: &ClientError);
}

/// Default reporter that logs through `tracing`
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn on_http_error(&self, error: &ClientError) {
        tracing::error!("request failed: {error}");
    }
}
