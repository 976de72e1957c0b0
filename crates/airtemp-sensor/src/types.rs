use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Approximate host position, resolved once per process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One forecast instant: when, and the air temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub air_temperature: f64,
}
