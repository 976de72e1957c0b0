//! IP-based location lookup, memoized for the life of the process.
//!
//! There is no invalidation: if the host moves while running, the first
//! resolved coordinates keep being served.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::error::SensorError;
use crate::http::HttpJsonClient;
use crate::types::Coordinates;

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: serde_json::Value,
    reason: Option<String>,
}

impl GeolocationResponse {
    /// `error` counts when truthy: `true`, a non-zero number, a non-empty
    /// string, or any array/object. Missing, `null`, `false`, `0` and `""`
    /// do not.
    fn is_error(&self) -> bool {
        match &self.error {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(flag) => *flag,
            serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
        }
    }
}

#[derive(Debug)]
pub struct LocationResolver {
    http: HttpJsonClient,
    endpoint: String,
    coordinates: OnceCell<Coordinates>,
}

impl LocationResolver {
    pub fn new(http: HttpJsonClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            coordinates: OnceCell::new(),
        }
    }

    /// Resolve the host's coordinates, hitting the network only on the first
    /// successful call. Concurrent first callers share one lookup; a failed
    /// lookup leaves nothing memoized.
    pub async fn resolve_coordinates(&self) -> Result<Coordinates, SensorError> {
        self.coordinates
            .get_or_try_init(|| self.lookup())
            .await
            .copied()
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint), level = "debug")]
    async fn lookup(&self) -> Result<Coordinates, SensorError> {
        let response = self
            .http
            .request::<GeolocationResponse>(&self.endpoint, Some(lookup_headers()))
            .await?;
        let body = response.data;

        if body.is_error() {
            return Err(SensorError::LocationResolution(
                body.reason.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
            return Err(SensorError::LocationResolution(
                "response did not include coordinates".to_string(),
            ));
        };

        info!("Resolved location: {}, {}", latitude, longitude);
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

/// A throwaway User-Agent so the lookup cannot be tied to this product.
fn lookup_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let agent = uuid::Uuid::new_v4().simple().to_string();
    if let Ok(value) = HeaderValue::from_str(&agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}
