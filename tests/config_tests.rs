use irrigation_tool::config::{
    ENV_CACHE, ENV_COEFFICIENTS_PATH, ENV_FORECAST_API_KEY, ENV_GEOCODING, ENV_HTTP_ADDR,
    ENV_HTTP_TIMEOUT_SECS, ENV_WEATHER_SOURCE,
};
use irrigation_tool::{AppConfig, ConfigError, WeatherSourceKind};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn empty_environment_gives_defaults() {
    let config = config_from(&[]).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.weather_source, WeatherSourceKind::Synthetic);
    assert_eq!(config.http_timeout, Duration::from_secs(10));
    assert!(config.cache_enabled);
    assert!(config.geocoder_url.is_some());
}

#[test]
fn values_override_defaults() {
    let config = config_from(&[
        (ENV_WEATHER_SOURCE, "Forecast"),
        (ENV_FORECAST_API_KEY, " abc123 "),
        (ENV_HTTP_TIMEOUT_SECS, "3"),
        (ENV_GEOCODING, "off"),
        (ENV_CACHE, "no"),
        (ENV_HTTP_ADDR, "127.0.0.1:8080"),
    ])
    .unwrap();
    assert_eq!(config.weather_source, WeatherSourceKind::Forecast);
    assert_eq!(config.forecast_api_key.as_deref(), Some("abc123"));
    assert_eq!(config.http_timeout, Duration::from_secs(3));
    assert_eq!(config.geocoder_url, None);
    assert!(!config.cache_enabled);
    assert_eq!(config.http_addr, "127.0.0.1:8080");
}

#[test]
fn blank_values_are_ignored() {
    let config = config_from(&[(ENV_WEATHER_SOURCE, "  "), (ENV_CACHE, "")]).unwrap();
    assert_eq!(config.weather_source, WeatherSourceKind::Synthetic);
    assert!(config.cache_enabled);
}

#[test]
fn forecast_source_requires_a_key() {
    let err = config_from(&[(ENV_WEATHER_SOURCE, "live")]).unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey));
}

#[test]
fn invalid_values_name_the_key() {
    let err = config_from(&[(ENV_HTTP_TIMEOUT_SECS, "0")]).unwrap_err();
    assert!(err.to_string().contains(ENV_HTTP_TIMEOUT_SECS));

    let err = config_from(&[(ENV_WEATHER_SOURCE, "satellite")]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: ENV_WEATHER_SOURCE,
            ..
        }
    ));

    assert!(config_from(&[(ENV_CACHE, "maybe")]).is_err());
}

#[test]
fn planner_is_built_from_config() {
    let config = config_from(&[]).unwrap();
    let planner = config.build_planner().unwrap();
    assert_eq!(planner.source_name(), "synthetic");
    assert_eq!(planner.tables().crops().len(), 4);
}

#[test]
fn coefficient_file_is_loaded_from_config() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"{"crops":[{"name":"Barley","base_et0":2.8}],"soils":[{"name":"Peat","multiplier":0.7}]}"#,
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();
    let config = config_from(&[(ENV_COEFFICIENTS_PATH, path.as_str())]).unwrap();
    let tables = config.load_tables().unwrap();
    assert_eq!(tables.base_et0("Barley"), 2.8);
    assert!(!tables.is_custom_crop("Barley"));

    let broken = config_from(&[(ENV_COEFFICIENTS_PATH, "/nonexistent/coefficients.json")]).unwrap();
    assert!(matches!(
        broken.build_planner(),
        Err(ConfigError::Coefficients(_))
    ));
}
