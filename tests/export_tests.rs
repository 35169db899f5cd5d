use chrono::NaiveDate;
use irrigation_tool::{
    DateRange, IrrigationSchedule, ScheduleContext, ScheduleEngine, save_schedule_to_csv,
    save_schedule_to_json, schedule_to_csv_string, write_schedule_csv,
};
use irrigation_tool::weather::synthetic::synthesize_series;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_schedule(range: DateRange) -> IrrigationSchedule {
    let series = synthesize_series(range, 3.5);
    let entries = ScheduleEngine::compute(&series, 1.0, None);
    let context = ScheduleContext {
        crop: "Wheat".into(),
        soil: "Loam".into(),
        soil_multiplier: 1.0,
        custom_daily_rate: None,
        range,
        location: None,
        source: "synthetic".into(),
    };
    IrrigationSchedule::new(context, entries)
}

#[test]
fn csv_has_header_and_one_row_per_day() {
    let schedule = build_schedule(DateRange::new(d(2024, 1, 1), d(2024, 1, 3)));
    let csv = schedule_to_csv_string(&schedule).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Date,ET₀ (mm/day),Rain (mm),Irrigation (mm)",
            "2024-01-01,3.50,0.50,3.00",
            "2024-01-02,3.60,0.00,3.60",
            "2024-01-03,3.70,0.00,3.70",
        ]
    );
}

#[test]
fn empty_schedule_exports_header_only() {
    let schedule = build_schedule(DateRange::new(d(2024, 1, 3), d(2024, 1, 1)));
    assert!(schedule.is_empty());
    let csv = schedule_to_csv_string(&schedule).unwrap();
    assert_eq!(csv.trim_end(), "Date,ET₀ (mm/day),Rain (mm),Irrigation (mm)");
}

#[test]
fn csv_can_be_read_back_with_the_csv_crate() {
    let schedule = build_schedule(DateRange::new(d(2024, 3, 1), d(2024, 3, 7)));
    let file = NamedTempFile::new().unwrap();
    save_schedule_to_csv(&schedule, file.path()).unwrap();

    let mut reader = csv::Reader::from_path(file.path()).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 4);
    assert_eq!(&headers[1], "ET₀ (mm/day)");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 7);
    assert_eq!(&rows[5][0], "2024-03-06");
    assert_eq!(&rows[5][2], "0.50");
    let irrigation: f64 = rows[6][3].parse().unwrap();
    assert_eq!(irrigation, schedule.entries()[6].irrigation);
}

#[test]
fn csv_writer_accepts_any_sink() {
    let schedule = build_schedule(DateRange::new(d(2024, 1, 1), d(2024, 1, 1)));
    let mut buffer = Vec::new();
    write_schedule_csv(&schedule, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.ends_with("2024-01-01,3.50,0.50,3.00\n"));
}

#[test]
fn json_export_round_trips() {
    let schedule = build_schedule(DateRange::new(d(2024, 1, 1), d(2024, 1, 5)));
    let file = NamedTempFile::new().unwrap();
    save_schedule_to_json(&schedule, file.path()).unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let loaded: IrrigationSchedule = serde_json::from_str(&text).unwrap();
    assert_eq!(loaded, schedule);

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["context"]["crop"], "Wheat");
    assert_eq!(value["entries"][0]["date"], "2024-01-01");
    assert!(value["context"].get("location").is_none());
}

#[test]
fn export_to_missing_directory_fails() {
    let schedule = build_schedule(DateRange::new(d(2024, 1, 1), d(2024, 1, 2)));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("schedule.csv");
    assert!(save_schedule_to_csv(&schedule, &path).is_err());
}
