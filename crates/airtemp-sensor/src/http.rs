//! Single-shot GET client that always parses the body as JSON.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{SensorError, UpstreamResponse};

/// A successful (status in [200, 400)) response with its parsed body.
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct HttpJsonClient {
    client: reqwest::Client,
}

impl HttpJsonClient {
    /// Client with the transport's default timeouts.
    pub fn new() -> Result<Self, SensorError> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, SensorError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue exactly one GET and parse the whole body as JSON.
    ///
    /// The body is parsed before the status is inspected, so an error status
    /// with a JSON payload yields [`SensorError::Upstream`] carrying that
    /// payload, while a body that is not JSON yields
    /// [`SensorError::MalformedResponse`] whatever the status.
    #[instrument(skip(self, headers), level = "debug")]
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
    ) -> Result<JsonResponse<T>, SensorError> {
        let mut request = self.client.get(url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("GET {} -> {} ({} bytes)", url, status_code, body.len());

        let data: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|source| SensorError::MalformedResponse {
                status_code,
                source,
            })?;

        if !(200..400).contains(&status_code) {
            return Err(SensorError::Upstream(UpstreamResponse {
                status_code,
                data,
                headers,
            }));
        }

        let data = serde_json::from_value(data).map_err(|source| {
            SensorError::MalformedResponse {
                status_code,
                source,
            }
        })?;

        Ok(JsonResponse {
            status_code,
            data,
            headers,
        })
    }
}
