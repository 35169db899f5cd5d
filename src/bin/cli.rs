use chrono::{Duration, Local, NaiveDate};
use irrigation_tool::schedule::UNIX_EPOCH_DAYS_FROM_CE;
use irrigation_tool::{
    AppConfig, Coordinates, IrrigationPlanner, IrrigationSchedule, PlanOutcome, ReverseGeocoder,
    ScheduleRequest, save_schedule_to_csv, save_schedule_to_json,
};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

const CHART_WIDTH: usize = 40;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: &AnyValue| -> String {
        match av {
            AnyValue::Null => String::new(),
            AnyValue::Float64(v) => format!("{v:.2}"),
            AnyValue::Date(days) => {
                NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days)
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            }
            AnyValue::String(s) => s.to_string(),
            _ => av.to_string(),
        }
    };

    // Compute column widths
    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            if let Ok(ref av) = col.get(row_idx) {
                widths[ci] = widths[ci].max(cell(av).chars().count());
            }
        }
    }

    // Build horizontal separator
    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    // Header
    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push(' ');
        out.push_str(name);
        out.push_str(&" ".repeat(widths[i] - name.chars().count()));
        out.push_str(" |");
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    // Rows
    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let s = col.get(row_idx).map(|av| cell(&av)).unwrap_or_default();
            out.push(' ');
            out.push_str(&s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.chars().count())));
            out.push_str(" |");
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_chart(schedule: &IrrigationSchedule) -> String {
    let series = schedule.chart_series();
    let max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, v)| *v))
        .fold(0.0_f64, f64::max);
    let mut out = String::new();
    for s in &series {
        out.push_str(&s.name);
        out.push('\n');
        for (date, value) in &s.points {
            let bar = if max > 0.0 {
                ((value / max) * CHART_WIDTH as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!("  {date} {:>6.2} {}\n", value, "#".repeat(bar)));
        }
    }
    out
}

fn render_schedule(schedule: &IrrigationSchedule) -> String {
    match schedule.to_dataframe() {
        Ok(df) => render_df_as_text_table(&df),
        Err(e) => format!("Error rendering schedule: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  crops                              List crop types\n  soils                              List soil types\n  location <lat> <lon>               Select coordinates (decimal degrees)\n  dates <YYYY-MM-DD> <YYYY-MM-DD>    Set start and end date\n  crop <name>                        Select crop type\n  soil <name...>                     Select soil type\n  rate <mm>                          Daily rate for the Custom crop\n  rate clear                         Forget the custom daily rate\n  settings                           Show current selections\n  generate                           Generate the irrigation schedule\n  show                               Show the last schedule\n  chart                              Chart ET₀, rain and irrigation\n  export <csv|json> <path>           Write the last schedule to disk\n  quit|exit                          Exit"
    );
}

struct Session {
    location: Option<Coordinates>,
    place_name: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
    crop: String,
    soil: String,
    custom_rate: Option<f64>,
    schedule: Option<IrrigationSchedule>,
}

impl Session {
    fn new() -> Self {
        let today = Local::now().date_naive();
        Self {
            location: None,
            place_name: None,
            start: today,
            end: today + Duration::days(7),
            crop: "Wheat".to_string(),
            soil: "Loam".to_string(),
            custom_rate: None,
            schedule: None,
        }
    }

    fn request(&self) -> ScheduleRequest {
        let mut request = ScheduleRequest::new(self.start, self.end, &self.crop, &self.soil);
        request.location = self.location;
        request.custom_daily_rate = self.custom_rate;
        request
    }

    fn print(&self) {
        let location = match (&self.location, &self.place_name) {
            (Some(coords), Some(name)) => format!("{coords} ({name})"),
            (Some(coords), None) => coords.to_string(),
            _ => "not selected".to_string(),
        };
        println!("Location           : {location}");
        println!("Start date         : {}", self.start);
        println!("End date           : {}", self.end);
        println!("Crop               : {}", self.crop);
        println!("Soil               : {}", self.soil);
        match self.custom_rate {
            Some(rate) => println!("Custom daily rate  : {rate} mm/day"),
            None => println!("Custom daily rate  : -"),
        }
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn generate(planner: &IrrigationPlanner, session: &mut Session) {
    match planner.plan(&session.request()) {
        Ok(PlanOutcome::NeedsLocation) => {
            println!("Select a location to continue: location <lat> <lon>");
        }
        Ok(PlanOutcome::Planned(report)) => {
            for notice in &report.notices {
                println!("Warning: {notice}");
            }
            let schedule = report.schedule;
            if schedule.is_empty() {
                println!("Nothing to schedule for the selected range.");
            } else {
                println!(
                    "Irrigation schedule ({})\n{}",
                    schedule.summary().to_cli_summary(),
                    render_schedule(&schedule)
                );
            }
            session.schedule = Some(schedule);
        }
        Err(e) => println!("Error: {e}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return;
        }
    };
    let planner = match config.build_planner() {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("Startup error: {e}");
            return;
        }
    };
    let geocoder: Option<ReverseGeocoder> = match config.build_geocoder() {
        Ok(geocoder) => geocoder,
        Err(e) => {
            eprintln!("Reverse geocoding disabled: {e}");
            None
        }
    };

    let mut session = Session::new();
    println!("Irrigation Scheduler (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "crops" => {
                println!("Available crop types:");
                for crop in planner.tables().crops() {
                    match crop.base_et0 {
                        Some(rate) => println!("  {:<16} {:.2} mm/day", crop.name, rate),
                        None => println!("  {:<16} custom daily rate", crop.name),
                    }
                }
            }
            "soils" => {
                println!("Available soil types:");
                for soil in planner.tables().soils() {
                    println!("  {:<16} x{:.2}", soil.name, soil.multiplier);
                }
            }
            "location" => {
                let lat_s = parts.next();
                let lon_s = parts.next();
                match (lat_s, lon_s) {
                    (Some(lat_s), Some(lon_s)) => {
                        let (lat, lon) = match (lat_s.parse::<f64>(), lon_s.parse::<f64>()) {
                            (Ok(lat), Ok(lon)) => (lat, lon),
                            _ => {
                                println!("Invalid coordinates");
                                continue;
                            }
                        };
                        match Coordinates::new(lat, lon) {
                            Ok(coords) => {
                                println!("Selected coordinates: {coords}");
                                session.place_name = None;
                                if let Some(geocoder) = &geocoder {
                                    let (name, notice) = geocoder.place_name(coords);
                                    if let Some(name) = &name {
                                        println!("Location: {name}");
                                    }
                                    if let Some(notice) = notice {
                                        println!("Warning: {notice}");
                                    }
                                    session.place_name = name;
                                }
                                session.location = Some(coords);
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: location <lat> <lon>"),
                }
            }
            "dates" => {
                let start_s = parts.next();
                let end_s = parts.next();
                match (start_s.and_then(parse_date), end_s.and_then(parse_date)) {
                    (Some(start), Some(end)) => {
                        session.start = start;
                        session.end = end;
                        println!("Dates set: {start} to {end}");
                    }
                    _ => println!("Usage: dates <YYYY-MM-DD> <YYYY-MM-DD>"),
                }
            }
            "crop" | "soil" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    println!("Usage: {cmd} <name>");
                    continue;
                }
                if cmd == "crop" {
                    session.crop = name;
                    println!("Crop set to {}.", session.crop);
                    if session.custom_rate.is_some()
                        && !planner.tables().is_custom_crop(&session.crop)
                    {
                        session.custom_rate = None;
                        println!("Custom daily rate cleared.");
                    }
                } else {
                    session.soil = name;
                    println!("Soil set to {}.", session.soil);
                }
            }
            "rate" => match parts.next() {
                Some("clear") => {
                    session.custom_rate = None;
                    println!("Custom daily rate cleared.");
                }
                Some(rate_s) => match rate_s.parse::<f64>() {
                    Ok(rate) => {
                        session.custom_rate = Some(rate);
                        println!("Custom daily rate set to {rate} mm/day.");
                    }
                    Err(_) => println!("Invalid float"),
                },
                None => println!("Usage: rate <mm>|clear"),
            },
            "settings" => session.print(),
            "generate" => generate(&planner, &mut session),
            "show" => match &session.schedule {
                Some(schedule) => println!("{}", render_schedule(schedule)),
                None => println!("No schedule yet. Run 'generate' first."),
            },
            "chart" => match &session.schedule {
                Some(schedule) => print!("{}", render_chart(schedule)),
                None => println!("No schedule yet. Run 'generate' first."),
            },
            "export" => {
                let fmt = parts.next();
                let path = parts.next();
                let Some(schedule) = &session.schedule else {
                    println!("No schedule yet. Run 'generate' first.");
                    continue;
                };
                match (fmt, path) {
                    (Some("csv"), Some(path)) => match save_schedule_to_csv(schedule, path) {
                        Ok(_) => println!("Schedule exported to {path}"),
                        Err(e) => println!("Error exporting schedule: {e}"),
                    },
                    (Some("json"), Some(path)) => match save_schedule_to_json(schedule, path) {
                        Ok(_) => println!("Schedule exported to {path}"),
                        Err(e) => println!("Error exporting schedule: {e}"),
                    },
                    _ => println!("Usage: export <csv|json> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
