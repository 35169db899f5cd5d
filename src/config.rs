use crate::coefficients::{CoefficientError, CoefficientTables};
use crate::location::{DEFAULT_GEOCODER_URL, GeocodeError, ReverseGeocoder};
use crate::planner::IrrigationPlanner;
use crate::weather::forecast::DEFAULT_FORECAST_BASE_URL;
use crate::weather::{
    ForecastConfig, WeatherError, WeatherForecastAdapter, WeatherSeriesSynthesizer, WeatherSource,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const ENV_WEATHER_SOURCE: &str = "IRRIGATION_WEATHER_SOURCE";
pub const ENV_FORECAST_API_KEY: &str = "IRRIGATION_FORECAST_API_KEY";
pub const ENV_FORECAST_BASE_URL: &str = "IRRIGATION_FORECAST_BASE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "IRRIGATION_HTTP_TIMEOUT_SECS";
pub const ENV_GEOCODER_URL: &str = "IRRIGATION_GEOCODER_URL";
pub const ENV_GEOCODING: &str = "IRRIGATION_GEOCODING";
pub const ENV_COEFFICIENTS_PATH: &str = "IRRIGATION_COEFFICIENTS_PATH";
pub const ENV_CACHE: &str = "IRRIGATION_CACHE";
pub const ENV_HTTP_ADDR: &str = "IRRIGATION_HTTP_ADDR";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherSourceKind {
    Synthetic,
    Forecast,
}

impl FromStr for WeatherSourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "offline" => Ok(WeatherSourceKind::Synthetic),
            "forecast" | "live" => Ok(WeatherSourceKind::Forecast),
            _ => Err(()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    MissingApiKey,
    Coefficients(CoefficientError),
    Weather(WeatherError),
    Geocoder(GeocodeError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
            ConfigError::MissingApiKey => write!(
                f,
                "{ENV_FORECAST_API_KEY} must be set when {ENV_WEATHER_SOURCE}=forecast"
            ),
            ConfigError::Coefficients(err) => write!(f, "coefficient tables: {err}"),
            ConfigError::Weather(err) => write!(f, "weather source: {err}"),
            ConfigError::Geocoder(err) => write!(f, "geocoder: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<CoefficientError> for ConfigError {
    fn from(value: CoefficientError) -> Self {
        Self::Coefficients(value)
    }
}

impl From<WeatherError> for ConfigError {
    fn from(value: WeatherError) -> Self {
        Self::Weather(value)
    }
}

impl From<GeocodeError> for ConfigError {
    fn from(value: GeocodeError) -> Self {
        Self::Geocoder(value)
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub weather_source: WeatherSourceKind,
    pub forecast_api_key: Option<String>,
    pub forecast_base_url: String,
    pub http_timeout: Duration,
    /// `None` when reverse geocoding is switched off.
    pub geocoder_url: Option<String>,
    pub coefficients_path: Option<PathBuf>,
    pub cache_enabled: bool,
    pub http_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather_source: WeatherSourceKind::Synthetic,
            forecast_api_key: None,
            forecast_base_url: DEFAULT_FORECAST_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            geocoder_url: Some(DEFAULT_GEOCODER_URL.to_string()),
            coefficients_path: None,
            cache_enabled: true,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(value) = get(ENV_WEATHER_SOURCE) {
            config.weather_source = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_WEATHER_SOURCE,
                value: value.clone(),
            })?;
        }
        config.forecast_api_key = get(ENV_FORECAST_API_KEY).map(|key| key.trim().to_string());
        if let Some(url) = get(ENV_FORECAST_BASE_URL) {
            config.forecast_base_url = url.trim().to_string();
        }
        if let Some(value) = get(ENV_HTTP_TIMEOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_HTTP_TIMEOUT_SECS,
                    value: value.clone(),
                })?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = get(ENV_GEOCODER_URL) {
            config.geocoder_url = Some(url.trim().to_string());
        }
        if let Some(value) = get(ENV_GEOCODING) {
            if !parse_switch(ENV_GEOCODING, &value)? {
                config.geocoder_url = None;
            }
        }
        config.coefficients_path = get(ENV_COEFFICIENTS_PATH).map(PathBuf::from);
        if let Some(value) = get(ENV_CACHE) {
            config.cache_enabled = parse_switch(ENV_CACHE, &value)?;
        }
        if let Some(addr) = get(ENV_HTTP_ADDR) {
            config.http_addr = addr.trim().to_string();
        }

        if config.weather_source == WeatherSourceKind::Forecast
            && config.forecast_api_key.is_none()
        {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(config)
    }

    pub fn load_tables(&self) -> Result<CoefficientTables, ConfigError> {
        match &self.coefficients_path {
            Some(path) => {
                info!(path = %path.display(), "loading coefficient tables");
                Ok(CoefficientTables::from_json_file(path)?)
            }
            None => Ok(CoefficientTables::default()),
        }
    }

    pub fn build_weather_source(
        &self,
        tables: Arc<CoefficientTables>,
    ) -> Result<Box<dyn WeatherSource>, ConfigError> {
        match self.weather_source {
            WeatherSourceKind::Synthetic => Ok(Box::new(WeatherSeriesSynthesizer::new(tables))),
            WeatherSourceKind::Forecast => {
                let api_key = self
                    .forecast_api_key
                    .clone()
                    .ok_or(ConfigError::MissingApiKey)?;
                let config = ForecastConfig {
                    api_key,
                    base_url: self.forecast_base_url.clone(),
                    timeout: self.http_timeout,
                };
                Ok(Box::new(WeatherForecastAdapter::new(config)?))
            }
        }
    }

    pub fn build_planner(&self) -> Result<IrrigationPlanner, ConfigError> {
        let tables = Arc::new(self.load_tables()?);
        let source = self.build_weather_source(tables.clone())?;
        let planner = IrrigationPlanner::new(tables, source);
        info!(
            source = planner.source_name(),
            cache = self.cache_enabled,
            "irrigation planner ready"
        );
        Ok(if self.cache_enabled {
            planner.with_cache()
        } else {
            planner
        })
    }

    pub fn build_geocoder(&self) -> Result<Option<ReverseGeocoder>, ConfigError> {
        match &self.geocoder_url {
            Some(url) => Ok(Some(ReverseGeocoder::new(url.clone(), self.http_timeout)?)),
            None => Ok(None),
        }
    }
}

fn parse_switch(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
