use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{
    Client, Method, Request,
    header::{HeaderMap, HeaderName, HeaderValue},
};

use crate::args::DEFAULT_USER_AGENT;
use crate::error::HttpError;
use crate::run::RunConfig;

use super::transport::{Exchange, RequestTarget, Transport};

/// Builds the shared HTTP client for a run.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialised.
pub fn build_client(config: &RunConfig) -> Result<Client, HttpError> {
    let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .pool_max_idle_per_host(config.worker.get())
        .build()
        .map_err(|err| HttpError::BuildClient { source: err })
}

/// `Transport` backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(&self, target: &RequestTarget) -> Result<Exchange, HttpError> {
        let request = build_request(&self.client, target)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| HttpError::Transport { source: err })?;
        let status = response.status().as_u16();
        let body = drain_response_body(response)
            .await
            .map_err(|err| HttpError::ReadBody { source: err });
        Ok(Exchange { status, body })
    }
}

fn build_request(client: &Client, target: &RequestTarget) -> Result<Request, HttpError> {
    let method = Method::from_bytes(target.method.as_str().as_bytes()).map_err(|err| {
        HttpError::InvalidMethod {
            method: target.method.to_string(),
            reason: err.to_string(),
        }
    })?;

    let mut headers = HeaderMap::with_capacity(target.headers.len());
    for (name, value) in &target.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| HttpError::InvalidHeaderName {
                name: name.clone(),
                source: err,
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|err| HttpError::InvalidHeaderValue {
                name: name.clone(),
                source: err,
            })?;
        headers.insert(header_name, header_value);
    }

    let mut builder = client
        .request(method, target.endpoint.as_str())
        .headers(headers);
    if !target.query.is_empty() {
        builder = builder.query(&target.query);
    }
    builder
        .build()
        .map_err(|err| HttpError::BuildRequest { source: err })
}

// The response is consumed here, so the connection is released on every path.
async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
