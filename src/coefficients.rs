use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::warn;

/// Rate used for any crop without a registered base ET₀, in mm/day.
pub const FALLBACK_BASE_ET0: f64 = 3.0;
/// Multiplier used for any soil that is not registered.
pub const FALLBACK_SOIL_MULTIPLIER: f64 = 1.0;
/// Name of the open crop mode that takes an explicit daily rate.
pub const CUSTOM_CROP: &str = "Custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub name: String,
    /// Base ET₀ in mm/day. `None` for the custom crop, which has no table rate.
    pub base_et0: Option<f64>,
    #[serde(default)]
    pub allows_custom_rate: bool,
}

impl CropProfile {
    pub fn new(name: impl Into<String>, base_et0: f64) -> Self {
        Self {
            name: name.into(),
            base_et0: Some(base_et0),
            allows_custom_rate: false,
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_et0: None,
            allows_custom_rate: true,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.base_et0.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub name: String,
    pub multiplier: f64,
}

impl SoilProfile {
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        Self {
            name: name.into(),
            multiplier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Crop,
    Soil,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Crop => write!(f, "crop"),
            ProfileKind::Soil => write!(f, "soil"),
        }
    }
}

/// Returned by the strict lookups when a name is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProfile {
    pub kind: ProfileKind,
    pub name: String,
}

impl fmt::Display for UnknownProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} profile '{}'", self.kind, self.name)
    }
}

impl std::error::Error for UnknownProfile {}

#[derive(Debug)]
pub enum CoefficientError {
    Io(io::Error),
    Parse(serde_json::Error),
    EmptyTable(ProfileKind),
    DuplicateName { kind: ProfileKind, name: String },
    InvalidValue { kind: ProfileKind, name: String, value: f64 },
}

impl fmt::Display for CoefficientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoefficientError::Io(err) => write!(f, "io error: {err}"),
            CoefficientError::Parse(err) => write!(f, "invalid coefficient tables: {err}"),
            CoefficientError::EmptyTable(kind) => write!(f, "no {kind} profiles defined"),
            CoefficientError::DuplicateName { kind, name } => {
                write!(f, "{kind} profile '{name}' is defined more than once")
            }
            CoefficientError::InvalidValue { kind, name, value } => write!(
                f,
                "{kind} profile '{name}' has invalid value {value} (must be positive and finite)"
            ),
        }
    }
}

impl std::error::Error for CoefficientError {}

impl From<io::Error> for CoefficientError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CoefficientError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Serializable form of the tables, as read from a coefficients file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTablesConfig {
    pub crops: Vec<CropProfile>,
    pub soils: Vec<SoilProfile>,
}

/// Crop and soil coefficients. Built once at startup and handed to whoever
/// needs them; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTables {
    crops: Vec<CropProfile>,
    soils: Vec<SoilProfile>,
}

impl Default for CoefficientTables {
    fn default() -> Self {
        Self {
            crops: vec![
                CropProfile::new("Wheat", 3.5),
                CropProfile::new("Rice", 4.0),
                CropProfile::new("Corn", 4.5),
                CropProfile::custom(CUSTOM_CROP),
            ],
            soils: vec![
                SoilProfile::new("Clay", 0.8),
                SoilProfile::new("Silty Clay", 0.9),
                SoilProfile::new("Loam", 1.0),
                SoilProfile::new("Silt Loam", 1.1),
                SoilProfile::new("Sandy Loam", 1.2),
                SoilProfile::new("Sand", 1.4),
            ],
        }
    }
}

impl CoefficientTables {
    pub fn from_config(config: CoefficientTablesConfig) -> Result<Self, CoefficientError> {
        if config.crops.is_empty() {
            return Err(CoefficientError::EmptyTable(ProfileKind::Crop));
        }
        if config.soils.is_empty() {
            return Err(CoefficientError::EmptyTable(ProfileKind::Soil));
        }

        let mut seen = HashSet::new();
        for crop in &config.crops {
            if !seen.insert(normalize(&crop.name)) {
                return Err(CoefficientError::DuplicateName {
                    kind: ProfileKind::Crop,
                    name: crop.name.clone(),
                });
            }
            if let Some(rate) = crop.base_et0 {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(CoefficientError::InvalidValue {
                        kind: ProfileKind::Crop,
                        name: crop.name.clone(),
                        value: rate,
                    });
                }
            }
        }

        seen.clear();
        for soil in &config.soils {
            if !seen.insert(normalize(&soil.name)) {
                return Err(CoefficientError::DuplicateName {
                    kind: ProfileKind::Soil,
                    name: soil.name.clone(),
                });
            }
            if !soil.multiplier.is_finite() || soil.multiplier <= 0.0 {
                return Err(CoefficientError::InvalidValue {
                    kind: ProfileKind::Soil,
                    name: soil.name.clone(),
                    value: soil.multiplier,
                });
            }
        }

        Ok(Self {
            crops: config.crops,
            soils: config.soils,
        })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CoefficientError> {
        let file = File::open(path)?;
        let config: CoefficientTablesConfig = serde_json::from_reader(file)?;
        Self::from_config(config)
    }

    pub fn to_config(&self) -> CoefficientTablesConfig {
        CoefficientTablesConfig {
            crops: self.crops.clone(),
            soils: self.soils.clone(),
        }
    }

    pub fn crops(&self) -> &[CropProfile] {
        &self.crops
    }

    pub fn soils(&self) -> &[SoilProfile] {
        &self.soils
    }

    pub fn crop(&self, name: &str) -> Result<&CropProfile, UnknownProfile> {
        let key = normalize(name);
        self.crops
            .iter()
            .find(|crop| normalize(&crop.name) == key)
            .ok_or_else(|| UnknownProfile {
                kind: ProfileKind::Crop,
                name: name.to_string(),
            })
    }

    pub fn soil(&self, name: &str) -> Result<&SoilProfile, UnknownProfile> {
        let key = normalize(name);
        self.soils
            .iter()
            .find(|soil| normalize(&soil.name) == key)
            .ok_or_else(|| UnknownProfile {
                kind: ProfileKind::Soil,
                name: name.to_string(),
            })
    }

    /// Base ET₀ for a crop, falling back to [`FALLBACK_BASE_ET0`] for unknown
    /// names and for crops that carry no table rate.
    pub fn base_et0(&self, crop_name: &str) -> f64 {
        match self.crop(crop_name) {
            Ok(crop) => crop.base_et0.unwrap_or(FALLBACK_BASE_ET0),
            Err(err) => {
                warn!(crop = crop_name, fallback = FALLBACK_BASE_ET0, "{err}, using fallback rate");
                FALLBACK_BASE_ET0
            }
        }
    }

    /// Multiplier for a soil, falling back to [`FALLBACK_SOIL_MULTIPLIER`].
    pub fn soil_multiplier(&self, soil_name: &str) -> f64 {
        match self.soil(soil_name) {
            Ok(soil) => soil.multiplier,
            Err(err) => {
                warn!(
                    soil = soil_name,
                    fallback = FALLBACK_SOIL_MULTIPLIER,
                    "{err}, using fallback multiplier"
                );
                FALLBACK_SOIL_MULTIPLIER
            }
        }
    }

    /// True when the crop selects the custom-rate mode.
    pub fn is_custom_crop(&self, crop_name: &str) -> bool {
        self.crop(crop_name)
            .map(|crop| crop.allows_custom_rate)
            .unwrap_or(false)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
