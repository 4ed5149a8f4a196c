//! Issues one outbound GET and folds every outcome into a [`RequestResult`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::http::{HttpClient, HttpResponse};

use super::types::{Endpoint, ErrorKind, RequestResult};

/// Issues requests against a fixed endpoint.
///
/// Cheap to clone: the HTTP client is shared.
#[derive(Clone)]
pub struct Requester<H: HttpClient> {
    http_client: Arc<H>,
    endpoint: Endpoint,
}

impl<H> Requester<H>
where
    H: HttpClient + 'static,
{
    pub fn new(http_client: Arc<H>, endpoint: Endpoint) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Issue one request.
    ///
    /// `identifier` only correlates log lines; it is never sent over the wire
    /// and is echoed back in [`RequestResult::Success`]. Never fails: every
    /// error is mapped to an [`ErrorKind`].
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn issue(&self, identifier: &str) -> RequestResult {
        tracing::info!("Issuing request");

        let result = self.execute(identifier).await;

        match &result {
            RequestResult::Success(_) => tracing::info!("Request finished"),
            RequestResult::Failure(kind) => {
                tracing::warn!(error_kind = ?kind, error = %kind, "Request finished with failure")
            }
        }

        result
    }

    /// Issue one request on a spawned task and hand the result to `completion`.
    ///
    /// `completion` runs exactly once, on the spawned task.
    pub fn issue_then<F>(&self, identifier: impl Into<String>, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(RequestResult) + Send + 'static,
    {
        let requester = self.clone();
        let identifier = identifier.into();
        tokio::spawn(async move {
            let result = requester.issue(&identifier).await;
            completion(result);
        })
    }

    async fn execute(&self, identifier: &str) -> RequestResult {
        let url = match self.endpoint.to_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(error = %e, "Endpoint rejected before dispatch");
                return RequestResult::Failure(ErrorKind::InvalidEndpoint);
            }
        };

        match self.http_client.execute(&url).await {
            Ok(response) => classify(identifier, &response),
            Err(e) => {
                tracing::debug!(error = %e, "Transport failure");
                RequestResult::Failure(ErrorKind::TransportError)
            }
        }
    }
}

/// Map a response that did arrive onto a result.
///
/// A missing body is checked before the status code.
pub fn classify(identifier: &str, response: &HttpResponse) -> RequestResult {
    if response.body.is_empty() {
        return RequestResult::Failure(ErrorKind::NoData);
    }

    if !(200..=299).contains(&response.status) {
        return RequestResult::Failure(ErrorKind::InvalidStatusCode);
    }

    RequestResult::Success(identifier.to_string())
}
