use crate::coefficients::CoefficientTables;
use crate::observation::{DailyObservation, DateRange, round2};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One day of the finished schedule. All figures are in mm and rounded to
/// two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub et0_adjusted: f64,
    pub rain: f64,
    pub irrigation: f64,
}

/// Turns a weather series into irrigation requirements.
///
/// The transform itself is pure: no I/O, no shared state, same output for
/// the same input. The borrowed tables only resolve soil names to
/// multipliers for callers that hold a soil name rather than a number.
pub struct ScheduleEngine<'a> {
    tables: &'a CoefficientTables,
}

impl<'a> ScheduleEngine<'a> {
    pub fn new(tables: &'a CoefficientTables) -> Self {
        Self { tables }
    }

    /// Compute using the multiplier registered for `soil_name`.
    pub fn compute_for_soil(
        &self,
        series: &[DailyObservation],
        soil_name: &str,
        custom_daily_rate: Option<f64>,
    ) -> Vec<ScheduleEntry> {
        let multiplier = self.tables.soil_multiplier(soil_name);
        Self::compute(series, multiplier, custom_daily_rate)
    }

    /// Per observation, in order:
    /// `et0_adjusted = round(et0_raw * soil_multiplier, 2)` and
    /// `irrigation = round(max(0, et0_adjusted - rain), 2)`.
    ///
    /// With a custom daily rate the observed ET₀ and rain are ignored: every
    /// date gets the constant rate and no rainfall offset.
    pub fn compute(
        series: &[DailyObservation],
        soil_multiplier: f64,
        custom_daily_rate: Option<f64>,
    ) -> Vec<ScheduleEntry> {
        let entries: Vec<ScheduleEntry> = match custom_daily_rate {
            Some(rate) => series
                .iter()
                .map(|obs| Self::custom_entry(obs.date, rate))
                .collect(),
            None => series
                .iter()
                .map(|obs| {
                    let et0_adjusted = round2(obs.et0_raw * soil_multiplier);
                    ScheduleEntry {
                        date: obs.date,
                        et0_adjusted,
                        rain: obs.rain,
                        irrigation: irrigation_requirement(et0_adjusted, obs.rain),
                    }
                })
                .collect(),
        };
        debug!(
            days = entries.len(),
            soil_multiplier,
            custom_rate = ?custom_daily_rate,
            "computed irrigation entries"
        );
        entries
    }

    /// Custom crop mode has no weather source, so the entries come straight
    /// from the requested range.
    pub fn compute_custom(range: DateRange, custom_daily_rate: f64) -> Vec<ScheduleEntry> {
        range
            .days()
            .map(|date| Self::custom_entry(date, custom_daily_rate))
            .collect()
    }

    fn custom_entry(date: NaiveDate, rate: f64) -> ScheduleEntry {
        let et0_adjusted = round2(rate.max(0.0));
        ScheduleEntry {
            date,
            et0_adjusted,
            rain: 0.0,
            irrigation: irrigation_requirement(et0_adjusted, 0.0),
        }
    }
}

/// Adjusted ET₀ minus effective rainfall, floored at zero.
pub fn irrigation_requirement(et0_adjusted: f64, rain: f64) -> f64 {
    round2((et0_adjusted - rain).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirement_never_negative() {
        assert_eq!(irrigation_requirement(1.0, 25.0), 0.0);
        assert_eq!(irrigation_requirement(0.0, 0.0), 0.0);
        assert_eq!(irrigation_requirement(4.25, 0.5), 3.75);
    }

    #[test]
    fn negative_custom_rate_is_floored() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let entry = ScheduleEngine::custom_entry(date, -2.0);
        assert_eq!(entry.et0_adjusted, 0.0);
        assert_eq!(entry.irrigation, 0.0);
    }
}
