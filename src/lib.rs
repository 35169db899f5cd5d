pub mod calculations;
pub mod coefficients;
pub mod config;
pub mod export;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod location;
pub mod notice;
pub mod observation;
pub mod planner;
pub mod schedule;
pub mod weather;

pub use calculations::demand::{ScheduleEngine, ScheduleEntry, irrigation_requirement};
pub use coefficients::{
    CoefficientError, CoefficientTables, CoefficientTablesConfig, CropProfile, SoilProfile,
    UnknownProfile,
};
pub use config::{AppConfig, ConfigError, WeatherSourceKind};
pub use export::{
    ExportError, save_schedule_to_csv, save_schedule_to_json, schedule_to_csv_string,
    write_schedule_csv,
};
pub use location::{Coordinates, GeocodeError, LocationError, ReverseGeocoder};
pub use notice::{Notice, NoticeKind};
pub use observation::{DailyObservation, DateRange, round2};
pub use planner::{IrrigationPlanner, PlanOutcome, PlanReport, RequestError, ScheduleRequest};
pub use schedule::{ChartSeries, IrrigationSchedule, ScheduleContext, ScheduleSummary};
pub use weather::{
    WeatherError, WeatherForecastAdapter, WeatherRequest, WeatherSeries,
    WeatherSeriesSynthesizer, WeatherSource,
};
