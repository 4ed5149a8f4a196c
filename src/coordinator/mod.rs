//! Join coordinators: launch N requests and observe their completion.
//!
//! Two interchangeable strategies drive the same [`Requester`](crate::request::Requester):
//! - [`BarrierJoin`]: all requests in flight at once, a continuation fires
//!   exactly once when the last one completes.
//! - [`SerialThrottle`]: one request at a time on a background task; request
//!   `i + 1` is never issued before request `i` completed.
//!
//! Neither strategy aggregates individual results. Failures are logged and
//! forwarded to the optional event sink, then dropped.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::request::RequestResult;

pub mod barrier;
pub mod throttle;

pub use barrier::{BarrierJoin, BarrierTicket, CompletionBarrier};
pub use throttle::SerialThrottle;

/// Something a coordinator observed while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinEvent {
    /// Request `index` was handed to the requester
    Issued { index: usize },
    /// Request `index` reported its result
    Completed { index: usize, result: RequestResult },
}

/// What a finished join reports. Carries the count only, never the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSummary {
    pub completed: usize,
    pub elapsed: Duration,
}

/// Optional observer channel shared by a coordinator and its request tasks.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<mpsc::UnboundedSender<JoinEvent>>);

impl EventSink {
    pub(crate) fn new(sender: mpsc::UnboundedSender<JoinEvent>) -> Self {
        Self(Some(sender))
    }

    /// A dropped receiver is not an error; the run carries on unobserved.
    pub(crate) fn emit(&self, event: JoinEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }
}

/// Log a single completion. Success and failure count the same for the join.
pub(crate) fn observe(index: usize, result: &RequestResult) {
    match result {
        RequestResult::Success(_) => {
            tracing::debug!(index, "Request counted towards join");
        }
        RequestResult::Failure(kind) => {
            tracing::debug!(index, error_kind = ?kind, "Failed request counted towards join");
        }
    }
}
