//! The requester: one outbound GET, one typed result.

pub mod requester;
pub mod types;

pub use requester::{Requester, classify};
pub use types::{Endpoint, ErrorKind, RequestResult, RunId};
