//! Forecast timeseries: upstream wire types, the in-memory cache, and
//! nearest-instant selection.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, CACHE_CONTROL, EXPIRES};
use serde::Deserialize;

use crate::error::SensorError;
use crate::types::ForecastPoint;

// ── Upstream response types ───────────────────────────────────────────

/// Body of `GET /locationforecast/2.0/compact`.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub timeseries: Vec<TimeseriesEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesEntry {
    pub time: DateTime<Utc>,
    pub data: TimeseriesData,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesData {
    pub instant: InstantData,
}

#[derive(Debug, Deserialize)]
pub struct InstantData {
    pub details: InstantDetails,
}

#[derive(Debug, Deserialize)]
pub struct InstantDetails {
    pub air_temperature: f64,
}

impl ForecastResponse {
    pub fn into_points(self) -> Vec<ForecastPoint> {
        self.properties
            .timeseries
            .into_iter()
            .map(|entry| ForecastPoint {
                timestamp: entry.time,
                air_temperature: entry.data.instant.details.air_temperature,
            })
            .collect()
    }
}

// ── Cache ─────────────────────────────────────────────────────────────

/// Last successfully fetched forecast and the instant it stops being valid.
///
/// Fresh means: points present and non-empty, and `now < valid_until`.
/// Anything else (never fetched, empty, expired, no expiry known) is stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastCache {
    points: Option<Vec<ForecastPoint>>,
    valid_until: Option<DateTime<Utc>>,
}

impl ForecastCache {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.points, self.valid_until) {
            (Some(points), Some(valid_until)) => !points.is_empty() && now < valid_until,
            _ => false,
        }
    }

    /// Replace the whole point set; no merging with what was there.
    pub fn replace(&mut self, points: Vec<ForecastPoint>, valid_until: Option<DateTime<Utc>>) {
        self.points = Some(points);
        self.valid_until = valid_until;
    }

    pub fn points(&self) -> Option<&[ForecastPoint]> {
        self.points.as_deref()
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    /// The cached point nearest to `now`.
    pub fn select(&self, now: DateTime<Utc>) -> Result<&ForecastPoint, SensorError> {
        select_nearest(self.points().unwrap_or_default(), now).ok_or(SensorError::NoForecastData)
    }
}

/// Point whose timestamp is closest to `now`, in either direction.
///
/// Input order does not matter. On an exact tie the earlier timestamp wins.
pub fn select_nearest(points: &[ForecastPoint], now: DateTime<Utc>) -> Option<&ForecastPoint> {
    points
        .iter()
        .min_by_key(|point| ((point.timestamp - now).abs(), point.timestamp))
}

// ── Expiry ────────────────────────────────────────────────────────────

/// When a forecast response stops being valid.
///
/// `Expires` wins; `Cache-Control: max-age` is the fallback. `None` means
/// the response must be treated as already expired.
pub fn expiry_from_headers(headers: &HeaderMap, received_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let expires = headers
        .get(EXPIRES)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date);

    if expires.is_some() {
        return expires;
    }

    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_max_age)
        .and_then(Duration::try_seconds)
        .and_then(|max_age| received_at.checked_add_signed(max_age))
}

/// Parse an HTTP-date such as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
}

fn parse_max_age(value: &str) -> Option<i64> {
    let directives: Vec<&str> = value.split(',').map(str::trim).collect();
    if directives
        .iter()
        .any(|d| d.eq_ignore_ascii_case("no-cache") || d.eq_ignore_ascii_case("no-store"))
    {
        return None;
    }

    directives.iter().find_map(|d| {
        let (name, secs) = d.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            secs.trim().trim_matches('"').parse::<i64>().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn point(now: DateTime<Utc>, offset_minutes: i64, temp: f64) -> ForecastPoint {
        ForecastPoint {
            timestamp: now + Duration::minutes(offset_minutes),
            air_temperature: temp,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_select_closest_timestamp() {
        let now = fixed_now();
        let points = vec![point(now, -180, 5.0), point(now, -60, 7.0), point(now, 120, 9.0)];
        assert_eq!(select_nearest(&points, now).unwrap().air_temperature, 7.0);
    }

    #[test]
    fn test_select_ignores_input_order() {
        let now = fixed_now();
        let points = vec![point(now, 120, 9.0), point(now, -180, 5.0), point(now, 20, 8.0), point(now, -60, 7.0)];
        assert_eq!(select_nearest(&points, now).unwrap().air_temperature, 8.0);
    }

    #[test]
    fn test_select_tie_prefers_earlier() {
        let now = fixed_now();
        let later_first = vec![point(now, 30, 11.0), point(now, -30, 10.0)];
        assert_eq!(select_nearest(&later_first, now).unwrap().air_temperature, 10.0);

        let earlier_first = vec![point(now, -30, 10.0), point(now, 30, 11.0)];
        assert_eq!(select_nearest(&earlier_first, now).unwrap().air_temperature, 10.0);
    }

    #[test]
    fn test_select_empty() {
        assert!(select_nearest(&[], fixed_now()).is_none());
        let cache = ForecastCache::default();
        assert!(matches!(cache.select(fixed_now()), Err(SensorError::NoForecastData)));
    }

    #[test]
    fn test_cache_freshness() {
        let now = fixed_now();
        let mut cache = ForecastCache::default();
        assert!(!cache.is_fresh(now));

        cache.replace(vec![point(now, 0, 1.0)], Some(now + Duration::minutes(30)));
        assert!(cache.is_fresh(now));
        assert!(!cache.is_fresh(now + Duration::minutes(30)));

        cache.replace(vec![point(now, 0, 1.0)], None);
        assert!(!cache.is_fresh(now));

        cache.replace(Vec::new(), Some(now + Duration::hours(1)));
        assert!(!cache.is_fresh(now));
    }

    #[test]
    fn test_cache_replace_is_wholesale() {
        let now = fixed_now();
        let mut cache = ForecastCache::default();
        cache.replace(vec![point(now, 0, 1.0), point(now, 60, 2.0)], None);
        cache.replace(vec![point(now, 120, 3.0)], None);
        assert_eq!(cache.points().unwrap().len(), 1);
        assert_eq!(cache.select(now).unwrap().air_temperature, 3.0);
    }

    #[test]
    fn test_parse_http_date() {
        let parsed = parse_http_date("Sat, 14 Mar 2026 12:30:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap());
        assert_eq!(parse_http_date("Sat, 14 Mar 2026 13:30:00 +0100"), Some(parsed));
        assert!(parse_http_date("tomorrow-ish").is_none());
        assert!(parse_http_date("0").is_none());
    }

    #[test]
    fn test_expiry_prefers_expires_header() {
        let now = fixed_now();
        let mut headers = HeaderMap::new();
        headers.insert(EXPIRES, HeaderValue::from_static("Sat, 14 Mar 2026 12:30:00 GMT"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        assert_eq!(
            expiry_from_headers(&headers, now),
            Some(now + Duration::minutes(30))
        );
    }

    #[test]
    fn test_expiry_falls_back_to_max_age() {
        let now = fixed_now();
        let mut headers = HeaderMap::new();
        headers.insert(EXPIRES, HeaderValue::from_static("garbage"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=600"));
        assert_eq!(
            expiry_from_headers(&headers, now),
            Some(now + Duration::seconds(600))
        );
    }

    #[test]
    fn test_expiry_missing_or_uncacheable() {
        let now = fixed_now();
        assert_eq!(expiry_from_headers(&HeaderMap::new(), now), None);

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, max-age=600"));
        assert_eq!(expiry_from_headers(&headers, now), None);
    }

    #[test]
    fn test_into_points_maps_every_entry() {
        let body = serde_json::json!({
            "type": "Feature",
            "properties": {
                "meta": { "updated_at": "2026-03-14T11:00:00Z" },
                "timeseries": [
                    {
                        "time": "2026-03-14T12:00:00Z",
                        "data": { "instant": { "details": { "air_temperature": 4.2, "wind_speed": 3.1 } } }
                    },
                    {
                        "time": "2026-03-14T13:00:00Z",
                        "data": {
                            "instant": { "details": { "air_temperature": 5.0 } },
                            "next_1_hours": { "summary": { "symbol_code": "cloudy" } }
                        }
                    }
                ]
            }
        });
        let response: ForecastResponse = serde_json::from_value(body).unwrap();
        let points = response.into_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, fixed_now());
        assert_eq!(points[1].air_temperature, 5.0);
    }
}
