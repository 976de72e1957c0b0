//! Sensor error types.

use reqwest::header::HeaderMap;
use thiserror::Error;

/// A non-success response, kept whole so callers can inspect the
/// upstream's own error payload.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status_code: u16,
    pub data: serde_json::Value,
    pub headers: HeaderMap,
}

#[derive(Error, Debug)]
pub enum SensorError {
    /// DNS, connection or TLS failure, or the body could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not JSON, or not the JSON shape we expected.
    #[error("Malformed response (status {status_code}): {source}")]
    MalformedResponse {
        status_code: u16,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed response with a status outside [200, 400).
    #[error("Upstream returned status {}", .0.status_code)]
    Upstream(UpstreamResponse),

    /// The geolocation service reported its own failure; carries its reason.
    #[error("{0}")]
    LocationResolution(String),

    #[error("Forecast contained no data points")]
    NoForecastData,

    #[error("Invalid sensor configuration: {0}")]
    InvalidConfig(String),
}

impl SensorError {
    /// Short message suitable for a host UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Network error. Check your connection.".to_string(),
            Self::MalformedResponse { .. } => {
                "The weather service sent an unreadable response.".to_string()
            }
            Self::Upstream(resp) if resp.status_code == 429 => {
                "The weather service is rate limiting requests.".to_string()
            }
            Self::Upstream(resp) if resp.status_code >= 500 => {
                "The weather service is having trouble. Try again later.".to_string()
            }
            Self::Upstream(resp) => format!("Weather request rejected ({})", resp.status_code),
            Self::LocationResolution(reason) => format!("Could not determine location: {}", reason),
            Self::NoForecastData => "No forecast is available for this location.".to_string(),
            Self::InvalidConfig(msg) => format!("Sensor misconfigured: {}", msg),
        }
    }

    /// The upstream status code, when the failure came from an HTTP response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::MalformedResponse { status_code, .. } => Some(*status_code),
            Self::Upstream(resp) => Some(resp.status_code),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status_code: u16) -> SensorError {
        SensorError::Upstream(UpstreamResponse {
            status_code,
            data: serde_json::json!({ "message": "nope" }),
            headers: HeaderMap::new(),
        })
    }

    #[test]
    fn test_location_error_message_is_reason() {
        let err = SensorError::LocationResolution("RateLimited".into());
        assert_eq!(err.to_string(), "RateLimited");
        assert!(err.user_message().contains("RateLimited"));
    }

    #[test]
    fn test_upstream_display_and_status() {
        let err = upstream(503);
        assert_eq!(err.to_string(), "Upstream returned status 503");
        assert_eq!(err.status_code(), Some(503));
        assert!(err.user_message().contains("trouble"));
        assert!(upstream(429).user_message().contains("rate limiting"));
        assert!(upstream(404).user_message().contains("404"));
    }

    #[test]
    fn test_malformed_carries_status() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = SensorError::MalformedResponse {
            status_code: 200,
            source,
        };
        assert_eq!(err.status_code(), Some(200));
        assert!(err.to_string().contains("status 200"));
    }

    #[test]
    fn test_no_status_for_local_errors() {
        assert_eq!(SensorError::NoForecastData.status_code(), None);
        assert_eq!(SensorError::LocationResolution("x".into()).status_code(), None);
    }
}
