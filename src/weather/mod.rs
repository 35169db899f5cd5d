//! Weather sources: anything that can produce a dated series of
//! [`DailyObservation`]s for a location and date range.
//!
//! Two implementations ship with the crate. [`WeatherSeriesSynthesizer`] is an
//! offline, deterministic generator; [`WeatherForecastAdapter`] queries a remote
//! daily forecast API. Callers pick one through configuration and only ever
//! see the [`WeatherSource`] trait.

use crate::location::Coordinates;
use crate::notice::Notice;
use crate::observation::{DailyObservation, DateRange};
use std::fmt;

pub mod forecast;
pub mod synthetic;

pub use forecast::{ForecastConfig, MAX_FORECAST_DAYS, WeatherForecastAdapter};
pub use synthetic::WeatherSeriesSynthesizer;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest<'a> {
    pub coordinates: Coordinates,
    pub range: DateRange,
    pub crop: &'a str,
}

/// Observations ordered by date ascending, one per day, plus any notices the
/// source raised while producing them (e.g. a clamped range).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    pub observations: Vec<DailyObservation>,
    pub notices: Vec<Notice>,
}

impl WeatherSeries {
    pub fn new(observations: Vec<DailyObservation>) -> Self {
        Self {
            observations,
            notices: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum WeatherError {
    Http(reqwest::Error),
    Status { status: u16, body: String },
    Payload(String),
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::Http(err) => write!(f, "forecast request failed: {err}"),
            WeatherError::Status { status, body } => {
                write!(f, "forecast provider returned status {status}: {body}")
            }
            WeatherError::Payload(msg) => write!(f, "malformed forecast payload: {msg}"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<reqwest::Error> for WeatherError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value.to_string())
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;

pub trait WeatherSource: Send + Sync {
    /// Short label used in logs and schedule context.
    fn name(&self) -> &'static str;

    /// The part of `range` this source can serve, with the notice to raise
    /// when that is shorter than what was asked for.
    fn served_range(&self, range: DateRange) -> (DateRange, Option<Notice>) {
        (range, None)
    }

    fn fetch(&self, request: &WeatherRequest<'_>) -> WeatherResult<WeatherSeries>;

    /// Whether repeated calls with the same request always return the same
    /// series. Only deterministic sources are eligible for caching.
    fn is_deterministic(&self) -> bool {
        false
    }
}
