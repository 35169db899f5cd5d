use super::{WeatherError, WeatherRequest, WeatherResult, WeatherSeries, WeatherSource};
use crate::notice::{Notice, NoticeKind};
use crate::observation::{DailyObservation, DateRange, round2};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Longest range the provider's free tier serves, in days.
pub const MAX_FORECAST_DAYS: usize = 5;
/// Rough conversion from daytime temperature (°C) to an ET₀ proxy (mm/day).
pub const TEMPERATURE_TO_ET0: f64 = 0.7;
/// Hard upper bound on the provider's `cnt` parameter.
const PROVIDER_MAX_COUNT: i64 = 16;

pub const DEFAULT_FORECAST_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ForecastConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_FORECAST_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Live weather source backed by a daily forecast API
/// (`GET {base_url}/forecast/daily`, OpenWeatherMap layout).
pub struct WeatherForecastAdapter {
    client: Client,
    config: ForecastConfig,
}

impl WeatherForecastAdapter {
    pub fn new(config: ForecastConfig) -> WeatherResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("irrigation-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/forecast/daily", self.config.base_url.trim_end_matches('/'))
    }

    fn request_day_count(range: DateRange, today: NaiveDate) -> i64 {
        ((range.end() - today).num_days() + 1).clamp(1, PROVIDER_MAX_COUNT)
    }
}

impl WeatherSource for WeatherForecastAdapter {
    fn name(&self) -> &'static str {
        "forecast"
    }

    fn served_range(&self, range: DateRange) -> (DateRange, Option<Notice>) {
        clamp_forecast_range(range)
    }

    fn fetch(&self, request: &WeatherRequest<'_>) -> WeatherResult<WeatherSeries> {
        let (range, clamp_notice) = clamp_forecast_range(request.range);
        if range.is_empty() {
            return Ok(WeatherSeries::default());
        }

        let count = Self::request_day_count(range, Utc::now().date_naive());
        info!(
            lat = request.coordinates.lat(),
            lon = request.coordinates.lon(),
            start = %range.start(),
            end = %range.end(),
            count,
            "requesting daily forecast"
        );

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("lat", request.coordinates.lat().to_string()),
                ("lon", request.coordinates.lon().to_string()),
                ("cnt", count.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.config.api_key.clone()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let observations = parse_daily_forecast(&body, range)?;
        let mut series = WeatherSeries::new(observations);
        series.notices.extend(clamp_notice);
        Ok(series)
    }
}

/// Cap a range at [`MAX_FORECAST_DAYS`], returning the warning to surface
/// when the end date had to be pulled in.
pub fn clamp_forecast_range(range: DateRange) -> (DateRange, Option<Notice>) {
    match range.clamped_to(MAX_FORECAST_DAYS) {
        Some(clamped) => {
            warn!(
                requested_end = %range.end(),
                clamped_end = %clamped.end(),
                "forecast range exceeds provider limit"
            );
            let notice = Notice::new(
                NoticeKind::RangeClamped,
                format!(
                    "Forecast data is limited to {MAX_FORECAST_DAYS} days; end date moved from {} to {}.",
                    range.end(),
                    clamped.end()
                ),
            );
            (clamped, Some(notice))
        }
        None => (range, None),
    }
}

#[derive(Debug, Deserialize)]
struct DailyForecastPayload {
    list: Vec<DailyForecastItem>,
}

#[derive(Debug, Deserialize)]
struct DailyForecastItem {
    dt: i64,
    temp: DailyTemperature,
    /// Precipitation in mm; the provider omits the field on dry days.
    #[serde(default)]
    rain: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyTemperature {
    day: f64,
}

/// Map a daily forecast payload onto observations inside `range`.
///
/// `et0_raw = round(max(0, temp.day * 0.7), 2)` and `rain = round(rain, 2)`.
/// Days outside the range are dropped; the result is sorted by date with
/// duplicate days removed.
pub fn parse_daily_forecast(body: &str, range: DateRange) -> WeatherResult<Vec<DailyObservation>> {
    let payload: DailyForecastPayload = serde_json::from_str(body)?;

    let mut observations = Vec::with_capacity(payload.list.len());
    for item in payload.list {
        let date = DateTime::<Utc>::from_timestamp(item.dt, 0)
            .ok_or_else(|| WeatherError::Payload(format!("invalid timestamp {}", item.dt)))?
            .date_naive();
        if !range.contains(date) {
            continue;
        }
        if !item.temp.day.is_finite() {
            return Err(WeatherError::Payload(format!(
                "non-numeric temperature for {date}"
            )));
        }
        let et0_raw = round2((item.temp.day * TEMPERATURE_TO_ET0).max(0.0));
        let rain = round2(item.rain.unwrap_or(0.0).max(0.0));
        observations.push(DailyObservation::new(date, et0_raw, rain));
    }

    observations.sort_by_key(|obs| obs.date);
    observations.dedup_by_key(|obs| obs.date);
    Ok(observations)
}
