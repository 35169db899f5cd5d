use crate::calculations::demand::ScheduleEntry;
use crate::location::Coordinates;
use crate::observation::{DateRange, round2};
use chrono::{Datelike, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const ET0_SERIES: &str = "ET₀ (mm/day)";
pub const RAIN_SERIES: &str = "Rain (mm)";
pub const IRRIGATION_SERIES: &str = "Irrigation (mm)";

/// The selections a schedule was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleContext {
    pub crop: String,
    pub soil: String,
    pub soil_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_daily_rate: Option<f64>,
    pub range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    /// Which weather source produced the input series.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub days: usize,
    pub total_et0: f64,
    pub total_rain: f64,
    pub total_irrigation: f64,
    /// Day with the largest irrigation requirement; earliest wins ties.
    pub peak_irrigation: Option<(NaiveDate, f64)>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("days={}", self.days));
        parts.push(format!("et0={:.2}mm", self.total_et0));
        parts.push(format!("rain={:.2}mm", self.total_rain));
        parts.push(format!("irrigation={:.2}mm", self.total_irrigation));
        if let Some((date, mm)) = self.peak_irrigation {
            parts.push(format!("peak={date} ({mm:.2}mm)"));
        }
        parts.join(", ")
    }
}

/// One named line of the schedule chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// A finished irrigation schedule, ready for table, chart or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationSchedule {
    context: ScheduleContext,
    entries: Vec<ScheduleEntry>,
}

impl IrrigationSchedule {
    pub fn new(context: ScheduleContext, entries: Vec<ScheduleEntry>) -> Self {
        Self { context, entries }
    }

    pub fn context(&self) -> &ScheduleContext {
        &self.context
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> ScheduleSummary {
        let mut peak: Option<(NaiveDate, f64)> = None;
        for entry in &self.entries {
            peak = Some(match peak {
                Some(current) if current.1 >= entry.irrigation => current,
                _ => (entry.date, entry.irrigation),
            });
        }
        ScheduleSummary {
            days: self.entries.len(),
            total_et0: round2(self.entries.iter().map(|e| e.et0_adjusted).sum()),
            total_rain: round2(self.entries.iter().map(|e| e.rain).sum()),
            total_irrigation: round2(self.entries.iter().map(|e| e.irrigation).sum()),
            peak_irrigation: peak,
        }
    }

    /// Adjusted ET₀, rainfall and irrigation as three date-indexed series.
    pub fn chart_series(&self) -> Vec<ChartSeries> {
        let series = |name: &str, pick: fn(&ScheduleEntry) -> f64| ChartSeries {
            name: name.to_string(),
            points: self.entries.iter().map(|e| (e.date, pick(e))).collect(),
        };
        vec![
            series(ET0_SERIES, |e| e.et0_adjusted),
            series(RAIN_SERIES, |e| e.rain),
            series(IRRIGATION_SERIES, |e| e.irrigation),
        ]
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let dates: Vec<i32> = self.entries.iter().map(|e| date_to_i32(e.date)).collect();
        let et0: Vec<f64> = self.entries.iter().map(|e| e.et0_adjusted).collect();
        let rain: Vec<f64> = self.entries.iter().map(|e| e.rain).collect();
        let irrigation: Vec<f64> = self.entries.iter().map(|e| e.irrigation).collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static("date"), dates)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static(ET0_SERIES), et0).into_column(),
            Series::new(PlSmallStr::from_static(RAIN_SERIES), rain).into_column(),
            Series::new(PlSmallStr::from_static(IRRIGATION_SERIES), irrigation).into_column(),
        ];
        DataFrame::new(columns)
    }
}

/// Days from 0001-01-01 (CE) to the Unix epoch, the origin of polars dates.
pub const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert NaiveDate to Polars i32 date
fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}
