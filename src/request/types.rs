//! Core types for a single outbound request.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ConvoyError, Result};

/// Why a request did not produce a [`RequestResult::Success`].
///
/// Each kind carries a fixed, human-readable description.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The connection failed or the response could not be read
    #[error("something went wrong, please try again later.")]
    TransportError,

    /// The endpoint could not be turned into a URL; no call was made
    #[error("invalid endpoint, please check the url.")]
    InvalidEndpoint,

    /// The server answered outside the 2xx range
    #[error("invalid status code, the server answered outside the 2xx range.")]
    InvalidStatusCode,

    /// The server answered without a body
    #[error("no data found, please try again later.")]
    NoData,
}

/// Outcome of one requester invocation.
///
/// Produced exactly once per issue call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum RequestResult {
    /// Carries the identifier the request was issued with
    Success(String),
    Failure(ErrorKind),
}

impl RequestResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestResult::Success(_))
    }

    /// The failure kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            RequestResult::Success(_) => None,
            RequestResult::Failure(kind) => Some(*kind),
        }
    }
}

impl From<RequestResult> for std::result::Result<String, ErrorKind> {
    fn from(result: RequestResult) -> Self {
        match result {
            RequestResult::Success(identifier) => Ok(identifier),
            RequestResult::Failure(kind) => Err(kind),
        }
    }
}

/// Target of every request: a scheme and a host, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// URL scheme (e.g., "https")
    pub scheme: String,
    /// Host name without path or query (e.g., "google.com")
    pub host: String,
}

impl Endpoint {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Build the request URL.
    ///
    /// Fails when either part is empty, when the pair does not parse, or when
    /// the host smuggles in anything beyond a bare host (path, query,
    /// fragment, credentials).
    pub fn to_url(&self) -> Result<reqwest::Url> {
        if self.scheme.is_empty() || self.host.is_empty() {
            return Err(ConvoyError::InvalidEndpoint(format!(
                "scheme and host are required, got '{}'",
                self
            )));
        }

        let url = reqwest::Url::parse(&self.to_string())
            .map_err(|e| ConvoyError::InvalidEndpoint(format!("{}: {}", self, e)))?;

        let bare = url.host_str().is_some_and(|host| !host.is_empty())
            && url.path() == "/"
            && url.query().is_none()
            && url.fragment().is_none()
            && url.username().is_empty()
            && url.password().is_none();

        if !bare {
            return Err(ConvoyError::InvalidEndpoint(format!(
                "{}: expected scheme and host only",
                self
            )));
        }

        Ok(url)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Unique identifier for one coordination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        RunId(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display only first 8 characters for readability in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        RunId(uuid)
    }
}

impl std::ops::Deref for RunId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_builds_bare_url() {
        let url = Endpoint::new("https", "google.com").to_url().unwrap();
        assert_eq!(url.as_str(), "https://google.com/");
        assert_eq!(url.host_str(), Some("google.com"));
    }

    #[test]
    fn test_endpoint_rejects_invalid_hosts() {
        for host in ["", "exa mple.com", "example.com/path", "example.com?q=1", "user@example.com"] {
            let result = Endpoint::new("https", host).to_url();
            assert!(
                matches!(result, Err(ConvoyError::InvalidEndpoint(_))),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_endpoint_rejects_missing_scheme() {
        assert!(Endpoint::new("", "google.com").to_url().is_err());
        assert!(Endpoint::new("mailto", "google.com").to_url().is_err());
    }

    #[test]
    fn test_error_kind_descriptions_are_fixed() {
        assert_eq!(
            ErrorKind::InvalidEndpoint.to_string(),
            "invalid endpoint, please check the url."
        );
        assert_eq!(
            ErrorKind::NoData.to_string(),
            "no data found, please try again later."
        );
    }

    #[test]
    fn test_request_result_into_std_result() {
        let ok: std::result::Result<String, ErrorKind> =
            RequestResult::Success("3".to_string()).into();
        assert_eq!(ok, Ok("3".to_string()));

        let failure = RequestResult::Failure(ErrorKind::InvalidStatusCode);
        assert!(!failure.is_success());
        assert_eq!(failure.error_kind(), Some(ErrorKind::InvalidStatusCode));
    }

    #[test]
    fn test_run_id_display_is_short() {
        let run_id = RunId::new();
        assert_eq!(run_id.to_string().len(), 8);
    }
}
