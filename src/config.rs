//! Run configuration.
//!
//! Built in code only; there is no config file and no environment lookup.

use serde::{Deserialize, Serialize};

use crate::request::Endpoint;

/// Where requests go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL scheme of the target endpoint
    pub scheme: String,

    /// Host of the target endpoint, without path or query
    pub host: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "google.com".to_string(),
        }
    }
}

impl From<&EndpointConfig> for Endpoint {
    fn from(config: &EndpointConfig) -> Self {
        Endpoint::new(config.scheme.clone(), config.host.clone())
    }
}

/// Configuration for a demo run of both join strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvoyConfig {
    /// Target of every request
    pub endpoint: EndpointConfig,

    /// Number of requests each strategy issues
    pub request_count: usize,
}

impl Default for ConvoyConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            request_count: 4,
        }
    }
}

impl ConvoyConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::from(&self.endpoint)
    }
}
