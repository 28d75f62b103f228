use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};

use super::{Session, SessionRecord};
use crate::PitwallError;

pub fn load_session_jsonl(source_file: &Path) -> Result<Session, PitwallError> {
    let records = serde_jsonlines::json_lines(source_file)
        .map_err(|e| PitwallError::SessionLoaderError { source: e })?
        .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
        .map_err(|e| PitwallError::SessionLoaderError { source: e })?;

    let path = source_file.display().to_string();
    let mut session = Session::default();
    let mut has_event = false;
    for record in records {
        match record {
            SessionRecord::Event(info) => {
                if has_event {
                    return Err(PitwallError::InvalidSessionFile {
                        path,
                        reason: "more than one event record".to_string(),
                    });
                }
                has_event = true;
                session.info = info;
            }
            SessionRecord::Driver(driver) => session.drivers.push(driver),
            SessionRecord::Lap(lap) => session.laps.push(lap),
            SessionRecord::Weather(sample) => session.weather.push(sample),
            SessionRecord::CarData(sample) => session.car_data.push(sample),
        }
    }

    if !has_event {
        return Err(PitwallError::MissingEventInfo { path });
    }

    let known_drivers: HashSet<&str> = session
        .drivers
        .iter()
        .map(|d| d.abbreviation.as_str())
        .collect();
    let unknown_drivers: HashSet<&str> = session
        .laps
        .iter()
        .map(|l| l.driver.as_str())
        .filter(|d| !known_drivers.contains(d))
        .collect();
    if !unknown_drivers.is_empty() {
        warn!(
            "Session file {} has laps for undeclared drivers: {:?}",
            path, unknown_drivers
        );
    }

    session.car_data.sort_by(|a, b| {
        a.driver
            .cmp(&b.driver)
            .then(a.lap_number.cmp(&b.lap_number))
            .then(a.time_s.total_cmp(&b.time_s))
    });

    debug!(
        "Session {} {} {}: {} weather samples, {} car samples",
        session.info.year,
        session.info.event_name,
        session.info.session_kind,
        session.weather.len(),
        session.car_data.len()
    );
    info!(
        "Loaded {:?}, found {} drivers with a total of {} laps",
        source_file,
        session.drivers.len(),
        session.laps.len()
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EVENT_LINE: &str = r#"{"Event":{"year":2023,"event_name":"Italian Grand Prix","location":"Monza","session_kind":"Race"}}"#;

    #[test]
    fn test_load_groups_records() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", EVENT_LINE).unwrap();
        writeln!(
            file,
            r#"{{"Driver":{{"number":"1","abbreviation":"VER","full_name":"Max Verstappen","team_name":"Red Bull Racing","team_color":"3671c6"}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Lap":{{"driver":"VER","lap_number":1,"lap_time_s":89.5,"time_s":3689.5,"stint":1,"compound":"MEDIUM","track_status":"1"}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Weather":{{"time_s":3600.0,"air_temp":28.1,"humidity":40.0,"pressure":1012.3,"rainfall":0.0,"track_temp":44.0,"wind_direction":180,"wind_speed":1.2}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"CarData":{{"driver":"VER","lap_number":1,"time_s":0.5,"speed":250.0,"throttle":100.0,"brake":false,"rpm":11000.0,"gear":7}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"CarData":{{"driver":"VER","lap_number":1,"time_s":0.1,"speed":245.0,"throttle":100.0,"brake":false,"rpm":10800.0,"gear":7}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let session = load_session_jsonl(file.path()).unwrap();
        assert_eq!(session.info.location, "Monza");
        assert_eq!(session.drivers.len(), 1);
        assert_eq!(session.laps.len(), 1);
        assert_eq!(session.laps[0].pit_in_time_s, None);
        assert_eq!(session.weather.len(), 1);
        assert_eq!(session.car_data.len(), 2);
        assert_eq!(session.car_data[0].time_s, 0.1);
        assert_eq!(session.car_data[0].distance_m, None);
    }

    #[test]
    fn test_missing_event_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"Lap":{{"driver":"VER","lap_number":1,"lap_time_s":89.5}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        match load_session_jsonl(file.path()) {
            Err(PitwallError::MissingEventInfo { .. }) => {}
            _ => panic!("Expected MissingEventInfo error"),
        }
    }

    #[test]
    fn test_duplicate_event_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", EVENT_LINE).unwrap();
        writeln!(file, "{}", EVENT_LINE).unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_session_jsonl(file.path()),
            Err(PitwallError::InvalidSessionFile { .. })
        ));
    }

    #[test]
    fn test_malformed_line_returns_loader_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", EVENT_LINE).unwrap();
        writeln!(file, "{{\"Lap\": not json").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_session_jsonl(file.path()),
            Err(PitwallError::SessionLoaderError { .. })
        ));
    }

    #[test]
    fn test_missing_file_returns_loader_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_session_jsonl(&dir.path().join("missing.jsonl")),
            Err(PitwallError::SessionLoaderError { .. })
        ));
    }

    #[test]
    fn test_laps_for_undeclared_driver_are_kept() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", EVENT_LINE).unwrap();
        writeln!(
            file,
            r#"{{"Driver":{{"number":"1","abbreviation":"VER","full_name":"Max Verstappen","team_name":"Red Bull Racing","team_color":"3671c6"}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Lap":{{"driver":"VER","lap_number":1,"lap_time_s":89.5,"time_s":3689.5}}}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Lap":{{"driver":"HAM","lap_number":1,"lap_time_s":90.1,"time_s":3690.1}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let session = load_session_jsonl(file.path()).unwrap();
        assert_eq!(session.drivers.len(), 1);
        assert_eq!(session.laps.len(), 2);
        assert!(session.laps.iter().any(|l| l.driver == "HAM"));
    }
}
