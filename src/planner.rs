use crate::calculations::demand::ScheduleEngine;
use crate::coefficients::{CoefficientTables, FALLBACK_BASE_ET0, FALLBACK_SOIL_MULTIPLIER};
use crate::location::Coordinates;
use crate::notice::{Notice, NoticeKind};
use crate::observation::DateRange;
use crate::schedule::{IrrigationSchedule, ScheduleContext};
use crate::weather::{WeatherRequest, WeatherSource};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_CACHE_CAPACITY: usize = 64;
/// Longest range a single request may cover, in days (about five years).
pub const MAX_SCHEDULE_DAYS: usize = 1830;

/// Everything the user selected for one "generate schedule" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub location: Option<Coordinates>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub crop: String,
    pub soil: String,
    /// Daily rate in mm for the custom crop mode.
    #[serde(default)]
    pub custom_daily_rate: Option<f64>,
}

impl ScheduleRequest {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        crop: impl Into<String>,
        soil: impl Into<String>,
    ) -> Self {
        Self {
            location: None,
            start_date,
            end_date,
            crop: crop.into(),
            soil: soil.into(),
            custom_daily_rate: None,
        }
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_custom_rate(mut self, rate: f64) -> Self {
        self.custom_daily_rate = Some(rate);
        self
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    CustomRateRequired { crop: String },
    CustomRateNotAllowed { crop: String },
    InvalidCustomRate(f64),
    RangeTooLong { days: usize, max: usize },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::CustomRateRequired { crop } => {
                write!(f, "crop '{crop}' requires an explicit daily rate")
            }
            RequestError::CustomRateNotAllowed { crop } => write!(
                f,
                "crop '{crop}' uses its table rate; a custom daily rate is only accepted for the custom crop"
            ),
            RequestError::InvalidCustomRate(rate) => {
                write!(f, "custom daily rate {rate} must be a positive number")
            }
            RequestError::RangeTooLong { days, max } => {
                write!(f, "date range covers {days} days; at most {max} are allowed")
            }
        }
    }
}

impl std::error::Error for RequestError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub schedule: IrrigationSchedule,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// No coordinates yet; nothing is computed and the user is prompted.
    NeedsLocation,
    Planned(PlanReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    range: DateRange,
    crop: String,
    soil: String,
    lat_bits: u64,
    lon_bits: u64,
}

impl CacheKey {
    fn new(request: &ScheduleRequest, location: Coordinates) -> Self {
        Self {
            range: request.range(),
            crop: request.crop.clone(),
            soil: request.soil.clone(),
            lat_bits: location.lat().to_bits(),
            lon_bits: location.lon().to_bits(),
        }
    }
}

/// Memoised plans keyed by the full request. Only ever filled from
/// deterministic sources, so a hit returns exactly what a recomputation would.
struct PlanCache {
    entries: Mutex<HashMap<CacheKey, PlanReport>>,
    capacity: usize,
}

impl PlanCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<PlanReport> {
        self.entries.lock().get(key).cloned()
    }

    fn insert(&self, key: CacheKey, report: PlanReport) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(key, report);
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Runs one request end to end: location check, weather series, engine.
pub struct IrrigationPlanner {
    tables: Arc<CoefficientTables>,
    source: Box<dyn WeatherSource>,
    cache: Option<PlanCache>,
}

impl IrrigationPlanner {
    pub fn new(tables: Arc<CoefficientTables>, source: Box<dyn WeatherSource>) -> Self {
        Self {
            tables,
            source,
            cache: None,
        }
    }

    pub fn with_cache(mut self) -> Self {
        self.cache = Some(PlanCache::new(DEFAULT_CACHE_CAPACITY));
        self
    }

    pub fn tables(&self) -> &CoefficientTables {
        &self.tables
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn cached_plans(&self) -> usize {
        self.cache.as_ref().map(PlanCache::len).unwrap_or(0)
    }

    pub fn plan(&self, request: &ScheduleRequest) -> Result<PlanOutcome, RequestError> {
        let Some(location) = request.location else {
            info!("no location selected, schedule not generated");
            return Ok(PlanOutcome::NeedsLocation);
        };

        let days = request.range().day_count();
        if days > MAX_SCHEDULE_DAYS {
            return Err(RequestError::RangeTooLong {
                days,
                max: MAX_SCHEDULE_DAYS,
            });
        }

        if self.tables.is_custom_crop(&request.crop) {
            return self.plan_custom(request, location).map(PlanOutcome::Planned);
        }
        if request.custom_daily_rate.is_some() {
            return Err(RequestError::CustomRateNotAllowed {
                crop: request.crop.clone(),
            });
        }

        let cacheable = self.source.is_deterministic();
        let key = CacheKey::new(request, location);
        if cacheable {
            if let Some(report) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
                info!(crop = %request.crop, soil = %request.soil, "serving cached plan");
                return Ok(PlanOutcome::Planned(report));
            }
        }

        let report = self.plan_from_source(request, location);
        let fetch_failed = report
            .notices
            .iter()
            .any(|notice| notice.kind == NoticeKind::UpstreamFetch);
        if cacheable && !fetch_failed {
            if let Some(cache) = &self.cache {
                cache.insert(key, report.clone());
            }
        }
        Ok(PlanOutcome::Planned(report))
    }

    fn plan_custom(
        &self,
        request: &ScheduleRequest,
        location: Coordinates,
    ) -> Result<PlanReport, RequestError> {
        let rate = request
            .custom_daily_rate
            .ok_or_else(|| RequestError::CustomRateRequired {
                crop: request.crop.clone(),
            })?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RequestError::InvalidCustomRate(rate));
        }

        let entries = ScheduleEngine::compute_custom(request.range(), rate);
        info!(crop = %request.crop, rate, days = entries.len(), "planned custom-rate schedule");
        let context = ScheduleContext {
            crop: request.crop.clone(),
            soil: request.soil.clone(),
            soil_multiplier: self.tables.soil_multiplier(&request.soil),
            custom_daily_rate: Some(rate),
            range: request.range(),
            location: Some(location),
            source: "custom".to_string(),
        };
        Ok(PlanReport {
            schedule: IrrigationSchedule::new(context, entries),
            notices: self.fallback_notices(request),
        })
    }

    fn plan_from_source(&self, request: &ScheduleRequest, location: Coordinates) -> PlanReport {
        let mut notices = self.fallback_notices(request);
        let (range, clamp_notice) = self.source.served_range(request.range());
        notices.extend(clamp_notice);
        let weather_request = WeatherRequest {
            coordinates: location,
            range,
            crop: &request.crop,
        };

        let observations = match self.source.fetch(&weather_request) {
            Ok(series) => {
                notices.extend(series.notices);
                series.observations
            }
            Err(err) => {
                warn!(source = self.source.name(), "{err}");
                notices.push(Notice::new(
                    NoticeKind::UpstreamFetch,
                    format!("Weather data could not be fetched, nothing to schedule. ({err})"),
                ));
                Vec::new()
            }
        };

        let engine = ScheduleEngine::new(&self.tables);
        let entries = engine.compute_for_soil(&observations, &request.soil, None);
        info!(
            source = self.source.name(),
            crop = %request.crop,
            soil = %request.soil,
            days = entries.len(),
            "planned irrigation schedule"
        );

        let context = ScheduleContext {
            crop: request.crop.clone(),
            soil: request.soil.clone(),
            soil_multiplier: self.tables.soil_multiplier(&request.soil),
            custom_daily_rate: None,
            range,
            location: Some(location),
            source: self.source.name().to_string(),
        };
        PlanReport {
            schedule: IrrigationSchedule::new(context, entries),
            notices,
        }
    }

    fn fallback_notices(&self, request: &ScheduleRequest) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Err(err) = self.tables.crop(&request.crop) {
            notices.push(Notice::new(
                NoticeKind::ProfileFallback,
                format!("{err}; using {FALLBACK_BASE_ET0} mm/day"),
            ));
        }
        if let Err(err) = self.tables.soil(&request.soil) {
            notices.push(Notice::new(
                NoticeKind::ProfileFallback,
                format!("{err}; using multiplier {FALLBACK_SOIL_MULTIPLIER}"),
            ));
        }
        notices
    }
}
