//! Executing requests.
//!
//! # Design
//! The client only depends on the [`Transport`] trait. [`UreqTransport`] is
//! the blocking implementation used in production; tests substitute
//! recording or scripted transports. A transport returns every HTTP status
//! as data and reports only failures that produced no response.

use tracing::{debug, warn};

use crate::config::{ClientConfig, Timeout};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport over a `ureq` agent configured with the client timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let builder = ureq::Agent::config_builder().http_status_as_error(false);
        let builder = match config.timeout() {
            Some(Timeout::Total(limit)) => builder.timeout_global(Some(limit)),
            Some(Timeout::Split { connect, read }) => builder
                .timeout_connect(Some(connect))
                .timeout_recv_response(Some(read))
                .timeout_recv_body(Some(read)),
            None => builder,
        };
        Self {
            agent: builder.build().new_agent(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let result = match method {
            HttpMethod::Get => {
                let mut req = self.agent.get(&url);
                for (name, value) in &headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            HttpMethod::Delete => {
                let mut req = self.agent.delete(&url);
                for (name, value) in &headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            HttpMethod::Post => {
                let mut req = self.agent.post(&url);
                for (name, value) in &headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => req.send(body.as_bytes()),
                    None => req.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| {
            warn!(%method, %url, error = %e, "DataCite request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("reading response body: {e}")))?;

        debug!(%method, %url, status, "DataCite response received");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
