// Terminal tables for the tabular analysis outputs

use comfy_table::{Table, presets::UTF8_FULL};

use crate::analysis::{Stint, TrackStatusByLap, WeatherByLap};
use crate::session::EventInfo;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

pub fn track_status_table(rows: &[TrackStatusByLap]) -> Table {
    let mut table = new_table(vec!["LapNumber", "TrackStatus", "Meaning"]);
    for row in rows {
        let meaning = row
            .statuses()
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            row.lap_number.to_string(),
            row.track_status.clone().unwrap_or_default(),
            meaning,
        ]);
    }
    table
}

pub fn weather_table(rows: &[WeatherByLap]) -> Table {
    let mut table = new_table(vec![
        "LapNumber",
        "AirTemp",
        "Humidity",
        "Pressure",
        "Rainfall",
        "TrackTemp",
        "WindDirection",
        "WindSpeed",
    ]);
    for row in rows {
        let mut cells = vec![row.lap_number.to_string()];
        match &row.weather {
            Some(w) => cells.extend([
                format!("{:.1}", w.air_temp),
                format!("{:.1}", w.humidity),
                format!("{:.1}", w.pressure),
                format!("{:.1}", w.rainfall),
                format!("{:.1}", w.track_temp),
                w.wind_direction.to_string(),
                format!("{:.1}", w.wind_speed),
            ]),
            None => cells.extend(std::iter::repeat_n("-".to_string(), 7)),
        }
        table.add_row(cells);
    }
    table
}

pub fn stints_table(stints: &[Stint]) -> Table {
    let mut table = new_table(vec!["Driver", "Stint", "Compound", "FirstLap", "LastLap", "Laps"]);
    for stint in stints {
        table.add_row(vec![
            stint.driver.clone(),
            stint.stint.to_string(),
            stint.compound.clone(),
            stint.first_lap.to_string(),
            stint.last_lap.to_string(),
            stint.length().to_string(),
        ]);
    }
    table
}

pub fn sessions_table(sessions: &[EventInfo]) -> Table {
    let mut table = new_table(vec!["Year", "Event", "Location", "Session"]);
    for info in sessions {
        table.add_row(vec![
            info.year.to_string(),
            info.event_name.clone(),
            info.location.clone(),
            info.session_kind.to_string(),
        ]);
    }
    table
}
