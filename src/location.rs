use crate::notice::{Notice, NoticeKind};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const GEOCODER_USER_AGENT: &str = "irrigation_app";

/// A point picked on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = LocationError;

    fn try_from(value: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(value.lat, value.lon)
    }
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(LocationError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(LocationError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {lat} is outside [-90, 90]")
            }
            LocationError::LongitudeOutOfRange(lon) => {
                write!(f, "longitude {lon} is outside [-180, 180]")
            }
        }
    }
}

impl std::error::Error for LocationError {}

#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    Status(u16),
    NotFound(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Http(err) => write!(f, "reverse lookup failed: {err}"),
            GeocodeError::Status(status) => write!(f, "reverse lookup returned status {status}"),
            GeocodeError::NotFound(msg) => write!(f, "no place found: {msg}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Deserialize)]
struct ReversePayload {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Resolves coordinates to a human-readable place name (Nominatim `reverse`).
pub struct ReverseGeocoder {
    client: Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(GEOCODER_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn lookup(&self, coordinates: Coordinates) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.lat().to_string()),
                ("lon", coordinates.lon().to_string()),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }
        let payload: ReversePayload = response.json()?;
        match (payload.display_name, payload.error) {
            (Some(name), _) if !name.trim().is_empty() => {
                debug!(%coordinates, place = %name, "resolved place name");
                Ok(name)
            }
            (_, Some(error)) => Err(GeocodeError::NotFound(error)),
            _ => Err(GeocodeError::NotFound(format!("{coordinates}"))),
        }
    }

    /// Best-effort lookup. A failure is turned into a notice and never
    /// blocks scheduling.
    pub fn place_name(&self, coordinates: Coordinates) -> (Option<String>, Option<Notice>) {
        match self.lookup(coordinates) {
            Ok(name) => (Some(name), None),
            Err(err) => {
                warn!(%coordinates, "{err}");
                let notice = Notice::new(
                    NoticeKind::GeocodeLookup,
                    format!("Could not retrieve location name. ({err})"),
                );
                (None, Some(notice))
            }
        }
    }
}
