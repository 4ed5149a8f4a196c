//! Serialized throttle: one request in flight at a time.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::Result;
use crate::http::HttpClient;
use crate::request::{Requester, RunId};

use super::{EventSink, JoinEvent, JoinSummary, observe};

/// Issues requests one after another on a single background task.
///
/// Request `i + 1` is issued only after request `i` reported its result, so
/// concurrency is fixed at one.
pub struct SerialThrottle<H: HttpClient> {
    requester: Requester<H>,
    run_id: RunId,
    events: EventSink,
}

impl<H> SerialThrottle<H>
where
    H: HttpClient + 'static,
{
    pub fn new(requester: Requester<H>) -> Self {
        Self {
            requester,
            run_id: RunId::new(),
            events: EventSink::default(),
        }
    }

    /// Stream every issue and completion to `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<JoinEvent>) -> Self {
        self.events = EventSink::new(sender);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Start the background task and return its handle without waiting.
    pub fn spawn(self, count: usize) -> JoinHandle<JoinSummary> {
        let span = tracing::info_span!("serial_throttle", run_id = %self.run_id, count);
        let SerialThrottle {
            requester, events, ..
        } = self;

        tokio::spawn(
            async move {
                let started = Instant::now();

                for index in 0..count {
                    events.emit(JoinEvent::Issued { index });
                    let result = requester.issue(&index.to_string()).await;
                    observe(index, &result);
                    events.emit(JoinEvent::Completed { index, result });
                }

                let summary = JoinSummary {
                    completed: count,
                    elapsed: started.elapsed(),
                };

                tracing::info!(
                    completed = summary.completed,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "All requests handled one at a time"
                );

                summary
            }
            .instrument(span),
        )
    }

    /// Run `count` requests serially and wait for the last one.
    ///
    /// # Errors
    /// Returns [`ConvoyError::TaskFailed`](crate::ConvoyError::TaskFailed)
    /// if the background task panicked.
    pub async fn run(self, count: usize) -> Result<JoinSummary> {
        Ok(self.spawn(count).await?)
    }
}
