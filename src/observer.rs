//! Observability port handed to the executor at construction.

use tracing::{debug, warn};

use crate::core::DriverError;

/// Receives the executor's diagnostic events.
///
/// The executor never logs through global state of its own; everything goes
/// through the observer it was built with.
pub trait ExecutionObserver {
    /// A command is about to be sent. `operation` is one of `EXECUTE`,
    /// `QUERY`, `UPDATE`, `CALL`, `PREPARE` or `SETUP`.
    fn on_command(&self, operation: &str, sql: &str);

    fn on_comment(&self, message: &str);

    /// Releasing a statement or cursor failed. The failure never replaces
    /// the outcome of the call that owned the resource.
    fn on_release_failure(&self, resource: &'static str, error: &DriverError);
}

/// Default observer: forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_command(&self, operation: &str, sql: &str) {
        debug!(operation, "Executing {operation} database command: {sql}");
    }

    fn on_comment(&self, message: &str) {
        debug!("{message}");
    }

    fn on_release_failure(&self, resource: &'static str, error: &DriverError) {
        warn!(resource, "Failed to release {resource}: {error}");
    }
}
