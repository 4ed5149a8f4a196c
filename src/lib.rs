//! Coordinating concurrent HTTP requests and joining on their completion.
//!
//! A [`Requester`] issues one GET against a fixed endpoint and reports a typed
//! [`RequestResult`]. Two coordinators drive it N times:
//!
//! - [`BarrierJoin`] launches every request at once and runs a continuation
//!   exactly once after the last completion (a counting barrier).
//! - [`SerialThrottle`] issues them one by one on a background task, never
//!   starting the next before the previous one reported back.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod request;

// Re-export commonly used types
pub use config::{ConvoyConfig, EndpointConfig};
pub use coordinator::{
    BarrierJoin, BarrierTicket, CompletionBarrier, JoinEvent, JoinSummary, SerialThrottle,
};
pub use error::{ConvoyError, Result};
pub use http::{HttpClient, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use request::{Endpoint, ErrorKind, RequestResult, Requester, RunId};
