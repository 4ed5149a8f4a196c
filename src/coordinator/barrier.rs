//! Counting barrier ("dispatch group") and the concurrent join built on it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;

use crate::http::HttpClient;
use crate::request::{Requester, RunId};

use super::{EventSink, JoinEvent, JoinSummary, observe};

/// Tracks outstanding work and wakes waiters when it drains to zero.
///
/// Each [`enter`](Self::enter) hands out a [`BarrierTicket`]; dropping the
/// ticket leaves the barrier. The count therefore never goes negative and
/// every entered unit leaves exactly once, even when its task panics.
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    pending: AtomicUsize,
    released: Notify,
}

impl CompletionBarrier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one more unit of outstanding work.
    pub fn enter(self: &Arc<Self>) -> BarrierTicket {
        self.pending.fetch_add(1, Ordering::SeqCst);
        BarrierTicket {
            barrier: self.clone(),
        }
    }

    /// Units entered but not yet left.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Resolve once no tickets are outstanding. Returns immediately if none
    /// were ever handed out.
    pub async fn wait(&self) {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a release between the
            // check and the await is not lost
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }

    fn leave(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "barrier left more often than entered");
        if previous == 1 {
            self.released.notify_waiters();
        }
    }
}

/// Proof of one outstanding unit. Leaves the barrier when dropped.
#[derive(Debug)]
#[must_use = "dropping the ticket leaves the barrier immediately"]
pub struct BarrierTicket {
    barrier: Arc<CompletionBarrier>,
}

impl Drop for BarrierTicket {
    fn drop(&mut self) {
        self.barrier.leave();
    }
}

/// Launches every request at once and runs a continuation when all are done.
pub struct BarrierJoin<H: HttpClient> {
    requester: Requester<H>,
    run_id: RunId,
    events: EventSink,
}

impl<H> BarrierJoin<H>
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

    /// Issue `count` requests concurrently and, once every one of them has
    /// reported back, run `continuation` on the calling task.
    ///
    /// Completion order is unspecified and results are not inspected: a
    /// failure counts the same as a success. There is no timeout, so a
    /// request that never completes stalls the join.
    #[tracing::instrument(skip(self, continuation), fields(run_id = %self.run_id, strategy = "barrier"))]
    pub async fn run<F, Fut, T>(self, count: usize, continuation: F) -> T
    where
        F: FnOnce(JoinSummary) -> Fut,
        Fut: Future<Output = T>,
    {
        let started = Instant::now();
        let barrier = CompletionBarrier::new();

        for index in 0..count {
            let ticket = barrier.enter();
            self.events.emit(JoinEvent::Issued { index });

            let events = self.events.clone();
            self.requester
                .issue_then(index.to_string(), move |result| {
                    observe(index, &result);
                    events.emit(JoinEvent::Completed { index, result });
                    drop(ticket);
                });
        }

        tracing::debug!(pending = barrier.pending(), "All requests dispatched");
        barrier.wait().await;

        let summary = JoinSummary {
            completed: count,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            completed = summary.completed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "All concurrent requests completed"
        );

        continuation(summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use crate::request::{Endpoint, ErrorKind, RequestResult};
    use std::collections::HashSet;
    use std::time::Duration;

    fn join(mock: &Arc<MockHttpClient>) -> BarrierJoin<MockHttpClient> {
        BarrierJoin::new(Requester::new(
            mock.clone(),
            Endpoint::new("https", "example.com"),
        ))
    }

    fn ok() -> crate::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: "ok".to_string(),
        })
    }

    #[tokio::test]
    async fn test_wait_without_tickets_returns_immediately() {
        let barrier = CompletionBarrier::new();
        tokio::time::timeout(Duration::from_millis(100), barrier.wait())
            .await
            .expect("empty barrier should not block");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tickets_dropped_concurrently_release_once() {
        let barrier = CompletionBarrier::new();
        let tickets: Vec<_> = (0..64).map(|_| barrier.enter()).collect();
        assert_eq!(barrier.pending(), 64);

        let waiter = {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.wait().await })
        };

        let mut handles = Vec::new();
        for ticket in tickets {
            handles.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                drop(ticket);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
        assert_eq!(barrier.pending(), 0);
    }

    #[tokio::test]
    async fn test_panicking_holder_still_leaves() {
        let barrier = CompletionBarrier::new();
        let ticket = barrier.enter();

        let handle = tokio::spawn(async move {
            let _ticket = ticket;
            panic!("request task blew up");
        });
        assert!(handle.await.is_err());

        assert_eq!(barrier.pending(), 0);
        tokio::time::timeout(Duration::from_millis(100), barrier.wait())
            .await
            .expect("barrier should be drained");
    }

    #[test_log::test(tokio::test)]
    async fn test_continuation_waits_for_every_request() {
        let mock = Arc::new(MockHttpClient::new());
        let triggers: Vec<_> = (0..4)
            .map(|_| mock.add_response_with_trigger("GET example.com", ok()))
            .collect();

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_continuation = fired.clone();
        let handle = tokio::spawn(join(&mock).run(4, move |summary| async move {
            fired_in_continuation.fetch_add(1, Ordering::SeqCst);
            summary
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(mock.in_flight_count(), 4);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Release out of order; only the count matters
        let mut triggers = triggers;
        while let Some(trigger) = triggers.pop() {
            assert!(!handle.is_finished());
            trigger.send(()).unwrap();
        }

        let summary = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("join should finish")
            .unwrap();
        assert_eq!(summary.completed, 4);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(mock.peak_in_flight(), 4);
    }

    #[test_log::test(tokio::test)]
    async fn test_failures_do_not_abort_join() {
        let mock = Arc::new(MockHttpClient::new());
        mock.add_response(
            "GET example.com",
            Err(crate::ConvoyError::Other(anyhow::anyhow!("reset"))),
        );
        mock.add_response(
            "GET example.com",
            Ok(HttpResponse {
                status: 404,
                body: "missing".to_string(),
            }),
        );
        mock.add_response("GET example.com", ok());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = join(&mock)
            .with_events(tx)
            .run(3, |summary| async move { summary })
            .await;
        assert_eq!(summary.completed, 3);

        let mut completed = HashSet::new();
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let JoinEvent::Completed { index, result } = event {
                completed.insert(index);
                kinds.push(result.error_kind());
            }
        }
        assert_eq!(completed, HashSet::from([0, 1, 2]));
        assert!(kinds.contains(&Some(ErrorKind::TransportError)));
        assert!(kinds.contains(&Some(ErrorKind::InvalidStatusCode)));
        assert!(kinds.contains(&None));
    }

    #[test_log::test(tokio::test)]
    async fn test_fires_exactly_once_for_any_count() {
        for count in [0usize, 1, 4, 16] {
            let mock = Arc::new(MockHttpClient::new());
            for _ in 0..count {
                mock.add_response("GET example.com", ok());
            }

            let (tx, mut rx) = mpsc::unbounded_channel();
            let fired = Arc::new(AtomicUsize::new(0));
            let fired_in_continuation = fired.clone();
            let summary = join(&mock)
                .with_events(tx)
                .run(count, move |summary| async move {
                    fired_in_continuation.fetch_add(1, Ordering::SeqCst);
                    summary
                })
                .await;

            assert_eq!(fired.load(Ordering::SeqCst), 1, "count = {count}");
            assert_eq!(summary.completed, count);

            // Every completion was recorded before the continuation ran
            let completions = std::iter::from_fn(|| rx.try_recv().ok())
                .filter(|event| {
                    matches!(
                        event,
                        JoinEvent::Completed {
                            result: RequestResult::Success(_),
                            ..
                        }
                    )
                })
                .count();
            assert_eq!(completions, count);
        }
    }
}
