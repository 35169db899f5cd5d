use super::{WeatherRequest, WeatherResult, WeatherSeries, WeatherSource};
use crate::coefficients::CoefficientTables;
use crate::observation::{DailyObservation, DateRange, round2};
use std::sync::Arc;
use tracing::debug;

/// Daily ET₀ increment of the synthetic series, in mm/day.
const DAILY_ET0_STEP: f64 = 0.1;
/// Every `RAIN_INTERVAL_DAYS`-th day (starting with the first) gets rain.
const RAIN_INTERVAL_DAYS: usize = 5;
const SYNTHETIC_RAIN_MM: f64 = 0.5;

/// Offline weather source producing a synthetic, deterministic series.
///
/// This is a placeholder model for demos and tests, not a meteorological
/// estimate: ET₀ starts at the crop's base rate and climbs 0.1 mm per day,
/// and 0.5 mm of rain falls on day 0 and every fifth day after it.
#[derive(Debug, Clone)]
pub struct WeatherSeriesSynthesizer {
    tables: Arc<CoefficientTables>,
}

impl WeatherSeriesSynthesizer {
    pub fn new(tables: Arc<CoefficientTables>) -> Self {
        Self { tables }
    }

    pub fn synthesize(&self, range: DateRange, crop: &str) -> Vec<DailyObservation> {
        synthesize_series(range, self.tables.base_et0(crop))
    }
}

impl WeatherSource for WeatherSeriesSynthesizer {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn fetch(&self, request: &WeatherRequest<'_>) -> WeatherResult<WeatherSeries> {
        let observations = self.synthesize(request.range, request.crop);
        debug!(
            crop = request.crop,
            days = observations.len(),
            "synthesized weather series"
        );
        Ok(WeatherSeries::new(observations))
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

pub fn synthesize_series(range: DateRange, base_et0: f64) -> Vec<DailyObservation> {
    range
        .days()
        .enumerate()
        .map(|(i, date)| {
            let et0_raw = round2(base_et0 + i as f64 * DAILY_ET0_STEP);
            let rain = if i % RAIN_INTERVAL_DAYS == 0 {
                SYNTHETIC_RAIN_MM
            } else {
                0.0
            };
            DailyObservation::new(date, et0_raw, rain)
        })
        .collect()
}
