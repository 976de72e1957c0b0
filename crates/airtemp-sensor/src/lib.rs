//! Ambient air temperature sensor for airtemp
//!
//! Resolves the host's approximate position by IP, fetches a forecast
//! timeseries for it, and reports the entry nearest to now.

pub mod error;
pub mod forecast;
pub mod http;
pub mod location;
pub mod sensor;
pub mod types;

pub use error::{SensorError, UpstreamResponse};
pub use forecast::{select_nearest, ForecastCache};
pub use http::{HttpJsonClient, JsonResponse};
pub use location::LocationResolver;
pub use sensor::{TemperatureAccessory, TemperatureSensor};
pub use types::{Coordinates, ForecastPoint};
