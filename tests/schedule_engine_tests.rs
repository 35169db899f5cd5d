use chrono::NaiveDate;
use irrigation_tool::weather::synthetic::synthesize_series;
use irrigation_tool::{
    CoefficientTables, DailyObservation, DateRange, ScheduleEngine, round2,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_series() -> Vec<DailyObservation> {
    vec![
        DailyObservation::new(d(2024, 5, 1), 4.37, 0.0),
        DailyObservation::new(d(2024, 5, 2), 5.1, 1.25),
        DailyObservation::new(d(2024, 5, 3), 2.0, 12.0),
        DailyObservation::new(d(2024, 5, 4), 3.33, 3.33),
        DailyObservation::new(d(2024, 5, 5), 0.0, 0.0),
    ]
}

#[test]
fn output_matches_input_length_and_order() {
    let series = sample_series();
    let entries = ScheduleEngine::compute(&series, 1.2, None);
    assert_eq!(entries.len(), series.len());
    for (entry, obs) in entries.iter().zip(&series) {
        assert_eq!(entry.date, obs.date);
        assert_eq!(entry.rain, obs.rain);
    }
}

#[test]
fn empty_series_gives_empty_schedule() {
    assert!(ScheduleEngine::compute(&[], 1.0, None).is_empty());
}

#[test]
fn adjusted_et0_scales_with_every_soil_multiplier() {
    let series = sample_series();
    for multiplier in [0.8, 0.9, 1.0, 1.1, 1.2, 1.4] {
        let entries = ScheduleEngine::compute(&series, multiplier, None);
        for (entry, obs) in entries.iter().zip(&series) {
            assert_eq!(entry.et0_adjusted, round2(obs.et0_raw * multiplier));
            assert_eq!(
                entry.irrigation,
                round2((entry.et0_adjusted - entry.rain).max(0.0))
            );
            assert!(entry.irrigation >= 0.0);
        }
    }
}

#[test]
fn heavy_rain_zeroes_the_requirement() {
    let series = sample_series();
    let entries = ScheduleEngine::compute(&series, 1.0, None);
    // 2.0 mm demand against 12 mm of rain, then rain exactly equal to demand.
    assert_eq!(entries[2].irrigation, 0.0);
    assert_eq!(entries[3].irrigation, 0.0);
    assert_eq!(entries[0].irrigation, 4.37);
    assert_eq!(entries[1].irrigation, 3.85);
}

#[test]
fn compute_for_soil_resolves_the_multiplier_by_name() {
    let tables = CoefficientTables::default();
    let engine = ScheduleEngine::new(&tables);
    let series = sample_series();

    let sand = engine.compute_for_soil(&series, "Sand", None);
    assert_eq!(sand, ScheduleEngine::compute(&series, 1.4, None));

    let unknown = engine.compute_for_soil(&series, "Peat", None);
    assert_eq!(unknown, ScheduleEngine::compute(&series, 1.0, None));
}

#[test]
fn custom_rate_overrides_weather_input() {
    let series = sample_series();
    let entries = ScheduleEngine::compute(&series, 1.4, Some(5.0));
    assert_eq!(entries.len(), series.len());
    for entry in &entries {
        assert_eq!(entry.et0_adjusted, 5.0);
        assert_eq!(entry.rain, 0.0);
        assert_eq!(entry.irrigation, 5.0);
    }
}

#[test]
fn custom_range_yields_one_entry_per_day() {
    let range = DateRange::new(d(2024, 6, 1), d(2024, 6, 3));
    let entries = ScheduleEngine::compute_custom(range, 5.0);
    let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![d(2024, 6, 1), d(2024, 6, 2), d(2024, 6, 3)]);
    assert!(entries.iter().all(|e| e.irrigation == 5.0 && e.rain == 0.0));

    let reversed = DateRange::new(d(2024, 6, 3), d(2024, 6, 1));
    assert!(ScheduleEngine::compute_custom(reversed, 5.0).is_empty());
}

#[test]
fn wheat_on_loam_over_five_days() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 5));
    let series = synthesize_series(range, 3.5);
    let entries = ScheduleEngine::compute(&series, 1.0, None);

    let et0: Vec<f64> = entries.iter().map(|e| e.et0_adjusted).collect();
    let rain: Vec<f64> = entries.iter().map(|e| e.rain).collect();
    let irrigation: Vec<f64> = entries.iter().map(|e| e.irrigation).collect();
    assert_eq!(et0, vec![3.5, 3.6, 3.7, 3.8, 3.9]);
    assert_eq!(rain, vec![0.5, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(irrigation, vec![3.0, 3.6, 3.7, 3.8, 3.9]);
}

#[test]
fn wheat_on_clay_rounds_each_day() {
    let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 5));
    let series = synthesize_series(range, 3.5);
    let entries = ScheduleEngine::compute(&series, 0.8, None);
    let et0: Vec<f64> = entries.iter().map(|e| e.et0_adjusted).collect();
    assert_eq!(et0, vec![2.8, 2.88, 2.96, 3.04, 3.12]);
    assert_eq!(entries[0].irrigation, 2.3);
}
