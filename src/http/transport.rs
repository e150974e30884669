use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::args::HttpMethod;
use crate::error::HttpError;
use crate::run::RunConfig;

/// Everything needed to build one request against the target.
#[derive(Debug, Clone)]
pub struct RequestTarget {
    pub method: HttpMethod,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl RequestTarget {
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            method: config.method.clone(),
            endpoint: config.endpoint.clone(),
            headers: config.headers.clone(),
            query: config.query.clone(),
        }
    }
}

/// A response whose headers arrived. `body` holds the drained byte count or
/// the error that interrupted the read.
#[derive(Debug)]
pub struct Exchange {
    pub status: u16,
    pub body: Result<u64, HttpError>,
}

/// Sends requests on behalf of the execution units.
///
/// Implementations are shared by every worker and must tolerate concurrent
/// callers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Builds and sends one request for `target`, then drains the response body.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be built or no response is
    /// received. A failed body read is reported inside the `Exchange` instead.
    async fn exchange(&self, target: &RequestTarget) -> Result<Exchange, HttpError>;
}
