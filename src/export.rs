use crate::schedule::{ET0_SERIES, IRRIGATION_SERIES, IrrigationSchedule, RAIN_SERIES};
use serde::Serialize;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub const DATE_COLUMN: &str = "Date";

#[derive(Debug)]
pub enum ExportError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    Csv(csv::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Serialization(err) => write!(f, "serialization error: {err}"),
            ExportError::Io(err) => write!(f, "io error: {err}"),
            ExportError::Csv(err) => write!(f, "csv error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<SerdeJsonError> for ExportError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for ExportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Serialize)]
struct ScheduleCsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "ET₀ (mm/day)")]
    et0: String,
    #[serde(rename = "Rain (mm)")]
    rain: String,
    #[serde(rename = "Irrigation (mm)")]
    irrigation: String,
}

/// Write one header row and one row per entry, in schedule order.
pub fn write_schedule_csv<W: Write>(schedule: &IrrigationSchedule, writer: W) -> ExportResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if schedule.is_empty() {
        // serialize() emits the header with the first record, so an empty
        // schedule needs it written out by hand.
        writer.write_record([DATE_COLUMN, ET0_SERIES, RAIN_SERIES, IRRIGATION_SERIES])?;
    }
    for entry in schedule.entries() {
        writer.serialize(ScheduleCsvRecord {
            date: entry.date.format("%Y-%m-%d").to_string(),
            et0: format!("{:.2}", entry.et0_adjusted),
            rain: format!("{:.2}", entry.rain),
            irrigation: format!("{:.2}", entry.irrigation),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn schedule_to_csv_string(schedule: &IrrigationSchedule) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_schedule_csv(schedule, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(
    schedule: &IrrigationSchedule,
    path: P,
) -> ExportResult<()> {
    let file = File::create(path)?;
    write_schedule_csv(schedule, file)
}

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &IrrigationSchedule,
    path: P,
) -> ExportResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, schedule)?;
    Ok(())
}
