//! The temperature sensor: forecast cache plus selection, driven by reads.

use std::sync::Arc;
use std::time::Duration;

use airtemp_core::{Accessory, AccessoryContext, SensorConfig, ServiceKind};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::error::SensorError;
use crate::forecast::{expiry_from_headers, ForecastCache, ForecastResponse};
use crate::http::HttpJsonClient;
use crate::location::LocationResolver;
use crate::types::{Coordinates, ForecastPoint};

/// Ambient air temperature at the host's approximate location.
///
/// Reads are served from the cached forecast while it is fresh. A read on a
/// stale cache refreshes it first; the cache lock is held across the
/// refresh, so overlapping stale reads share one forecast fetch.
pub struct TemperatureSensor {
    name: String,
    http: HttpJsonClient,
    resolver: LocationResolver,
    forecast_base_url: String,
    user_agent: HeaderValue,
    cache: Mutex<ForecastCache>,
    current: watch::Sender<Option<f64>>,
}

impl TemperatureSensor {
    pub fn new(config: &SensorConfig) -> Result<Self, SensorError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let http = HttpJsonClient::with_timeout(timeout)?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| SensorError::InvalidConfig(format!("user_agent: {}", e)))?;
        let resolver = LocationResolver::new(http.clone(), config.geolocation_url.clone());
        let (current, _) = watch::channel(None);

        Ok(Self {
            name: config.name.clone(),
            http,
            resolver,
            forecast_base_url: config.forecast_base_url.trim_end_matches('/').to_string(),
            user_agent,
            cache: Mutex::new(ForecastCache::default()),
            current,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current temperature in degrees Celsius.
    ///
    /// Any refresh failure is returned as-is, even when an older forecast is
    /// still cached.
    #[instrument(skip(self), fields(sensor = %self.name), level = "debug")]
    pub async fn get_temperature(&self) -> Result<f64, SensorError> {
        let mut cache = self.cache.lock().await;
        self.refresh_if_stale(&mut cache).await?;

        let value = cache.select(Utc::now())?.air_temperature;
        self.current.send_replace(Some(value));
        Ok(value)
    }

    /// Subscribe to "current value changed" notifications.
    ///
    /// Holds `None` until the first successful read.
    pub fn subscribe(&self) -> watch::Receiver<Option<f64>> {
        self.current.subscribe()
    }

    /// The last value published to subscribers.
    pub fn current_value(&self) -> Option<f64> {
        *self.current.borrow()
    }

    /// A copy of the cached forecast, for inspection.
    pub async fn cache_snapshot(&self) -> ForecastCache {
        self.cache.lock().await.clone()
    }

    async fn refresh_if_stale(&self, cache: &mut ForecastCache) -> Result<(), SensorError> {
        if cache.is_fresh(Utc::now()) {
            debug!("Forecast fresh until {:?}, skipping fetch", cache.valid_until());
            return Ok(());
        }

        let coordinates = self.resolver.resolve_coordinates().await?;
        let (points, valid_until) = self.fetch_forecast(coordinates).await?;

        info!(
            "Forecast refreshed: {} points, valid until {:?}",
            points.len(),
            valid_until
        );
        if valid_until.is_none() {
            warn!("Forecast response had no usable expiry; it will be refetched on next read");
        }

        cache.replace(points, valid_until);
        Ok(())
    }

    /// Fetch the forecast for `coordinates` without touching the cache.
    pub async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<(Vec<ForecastPoint>, Option<DateTime<Utc>>), SensorError> {
        let url = forecast_url(&self.forecast_base_url, coordinates);
        debug!("Fetching forecast: {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());

        let response = self.http.request::<ForecastResponse>(&url, Some(headers)).await?;
        let valid_until = expiry_from_headers(&response.headers, Utc::now());

        Ok((response.data.into_points(), valid_until))
    }
}

/// Compact forecast URL. Coordinates are rounded to the four decimals the
/// forecast API accepts.
pub fn forecast_url(base_url: &str, coordinates: Coordinates) -> String {
    format!(
        "{}/locationforecast/2.0/compact?lat={:.4}&lon={:.4}",
        base_url, coordinates.latitude, coordinates.longitude
    )
}

/// Host-facing wrapper that plugs a shared [`TemperatureSensor`] into the
/// accessory lifecycle.
pub struct TemperatureAccessory {
    id: String,
    sensor: Arc<TemperatureSensor>,
}

impl TemperatureAccessory {
    pub fn new(sensor: Arc<TemperatureSensor>) -> Self {
        let id = format!("airtemp.{}", slug(sensor.name()));
        Self { id, sensor }
    }
}

impl Accessory for TemperatureAccessory {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        self.sensor.name()
    }

    fn service(&self) -> ServiceKind {
        ServiceKind::TemperatureSensor
    }

    fn initialize(&mut self, ctx: &AccessoryContext) -> anyhow::Result<()> {
        info!(
            "{} publishing {} (polled every {}s)",
            self.id,
            self.service().characteristic(),
            ctx.config.host.poll_seconds
        );
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        // Subscribers should stop showing a value once the host is gone
        self.sensor.current.send_replace(None);
        Ok(())
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
