pub(crate) mod cache;
pub(crate) mod loader;
pub(crate) mod writer;

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::PitwallError;

pub use cache::{FileBasedCache, SessionProvider};
pub use loader::load_session_jsonl;
pub use writer::write_session;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKind {
    Practice1,
    Practice2,
    Practice3,
    SprintQualifying,
    Sprint,
    Qualifying,
    Race,
}

impl SessionKind {
    /// Short identifier used on the command line and as cache file stem
    pub fn code(&self) -> &'static str {
        match self {
            Self::Practice1 => "FP1",
            Self::Practice2 => "FP2",
            Self::Practice3 => "FP3",
            Self::SprintQualifying => "SQ",
            Self::Sprint => "S",
            Self::Qualifying => "Q",
            Self::Race => "R",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = PitwallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_', '-'], "");
        match normalized.as_str() {
            "fp1" | "practice1" => Ok(Self::Practice1),
            "fp2" | "practice2" => Ok(Self::Practice2),
            "fp3" | "practice3" => Ok(Self::Practice3),
            "sq" | "sprintqualifying" | "sprintshootout" => Ok(Self::SprintQualifying),
            "s" | "sprint" => Ok(Self::Sprint),
            "q" | "qualifying" => Ok(Self::Qualifying),
            "r" | "race" => Ok(Self::Race),
            _ => Err(PitwallError::InvalidUserInput {
                field: "session".to_string(),
                reason: format!("unknown session identifier '{}'", s),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventInfo {
    pub year: u16,
    /// Official event name, e.g. "Italian Grand Prix"
    pub event_name: String,
    /// Circuit location, e.g. "Monza"
    pub location: String,
    pub session_kind: SessionKind,
}

impl Default for EventInfo {
    fn default() -> Self {
        Self {
            year: 0,
            event_name: "Unknown".to_string(),
            location: "Unknown".to_string(),
            session_kind: SessionKind::Race,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DriverInfo {
    /// Car number as a string, e.g. "1" or "44"
    pub number: String,
    /// Three letter abbreviation, e.g. "VER"
    pub abbreviation: String,
    pub full_name: String,
    pub team_name: String,
    /// Team color as a hex string without the leading '#', may be empty
    #[serde(default)]
    pub team_color: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LapRecord {
    pub driver: String,
    pub lap_number: u32,
    /// Lap time in seconds
    pub lap_time_s: Option<f64>,
    /// Session time in seconds at which the lap was set
    pub time_s: Option<f64>,
    pub stint: Option<u32>,
    /// Tyre compound, e.g. "SOFT"
    pub compound: Option<String>,
    /// Track status codes seen during the lap, e.g. "1" or "24"
    pub track_status: Option<String>,
    /// Session time in seconds the car entered the pit lane on this lap
    pub pit_in_time_s: Option<f64>,
    /// Session time in seconds the car left the pit lane on this lap
    pub pit_out_time_s: Option<f64>,
}

impl LapRecord {
    pub fn is_pit_lap(&self) -> bool {
        self.pit_in_time_s.is_some() || self.pit_out_time_s.is_some()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherSample {
    /// Session time in seconds
    pub time_s: f64,
    /// Air temperature, °C
    pub air_temp: f32,
    /// Relative humidity, %
    pub humidity: f32,
    /// Air pressure, mbar
    pub pressure: f32,
    /// Rainfall, mm
    pub rainfall: f32,
    /// Track surface temperature, °C
    pub track_temp: f32,
    /// Wind direction, degrees
    pub wind_direction: u16,
    /// Wind speed, m/s
    pub wind_speed: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CarSample {
    pub driver: String,
    pub lap_number: u32,
    /// Seconds since the start of the lap
    pub time_s: f64,
    /// Meters from the start of the lap. Integrated from speed when missing
    #[serde(default)]
    pub distance_m: Option<f64>,
    /// Speed, km/h
    pub speed: f32,
    /// Throttle use, 0-100 %
    pub throttle: f32,
    pub brake: bool,
    pub rpm: f32,
    pub gear: u8,
    #[serde(default)]
    pub drs: u8,
}

/// One line of a session file
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SessionRecord {
    Event(EventInfo),
    Driver(DriverInfo),
    Lap(LapRecord),
    Weather(WeatherSample),
    CarData(CarSample),
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub info: EventInfo,
    /// Drivers in the order the session lists them
    pub drivers: Vec<DriverInfo>,
    pub laps: Vec<LapRecord>,
    pub weather: Vec<WeatherSample>,
    pub car_data: Vec<CarSample>,
}

impl Session {
    pub fn driver(&self, abbreviation: &str) -> Option<&DriverInfo> {
        self.drivers
            .iter()
            .find(|d| d.abbreviation == abbreviation)
    }

    /// Abbreviations in session driver order
    pub fn driver_abbreviations(&self) -> Vec<String> {
        self.drivers
            .iter()
            .map(|d| d.abbreviation.clone())
            .collect()
    }

    /// Abbreviations in the order they first appear in the lap data
    pub fn lap_drivers(&self) -> Vec<String> {
        self.laps
            .iter()
            .map(|l| l.driver.clone())
            .unique()
            .collect()
    }

    pub fn pick_driver_laps<'s>(
        &'s self,
        abbreviation: &'s str,
    ) -> impl Iterator<Item = &'s LapRecord> + 's {
        self.laps.iter().filter(move |l| l.driver == abbreviation)
    }

    pub fn pick_lap(&self, abbreviation: &str, lap_number: u32) -> Result<&LapRecord, PitwallError> {
        self.laps
            .iter()
            .find(|l| l.driver == abbreviation && l.lap_number == lap_number)
            .ok_or_else(|| PitwallError::LapNotFound {
                driver: abbreviation.to_string(),
                lap_number,
            })
    }

    /// Car telemetry of one lap, ordered by time
    pub fn lap_telemetry(&self, abbreviation: &str, lap_number: u32) -> Vec<CarSample> {
        self.car_data
            .iter()
            .filter(|s| s.driver == abbreviation && s.lap_number == lap_number)
            .cloned()
            .sorted_by(|a, b| a.time_s.total_cmp(&b.time_s))
            .collect()
    }

    /// Flattens the session back into file records, event first
    pub fn records(&self) -> impl Iterator<Item = SessionRecord> + '_ {
        std::iter::once(SessionRecord::Event(self.info.clone()))
            .chain(self.drivers.iter().cloned().map(SessionRecord::Driver))
            .chain(self.laps.iter().cloned().map(SessionRecord::Lap))
            .chain(self.weather.iter().cloned().map(SessionRecord::Weather))
            .chain(self.car_data.iter().cloned().map(SessionRecord::CarData))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) fn driver(abbreviation: &str, team: &str, color: &str) -> DriverInfo {
        DriverInfo {
            number: "0".to_string(),
            abbreviation: abbreviation.to_string(),
            full_name: abbreviation.to_string(),
            team_name: team.to_string(),
            team_color: color.to_string(),
        }
    }

    pub(crate) fn lap(driver: &str, lap_number: u32, lap_time_s: f64, time_s: f64) -> LapRecord {
        LapRecord {
            driver: driver.to_string(),
            lap_number,
            lap_time_s: Some(lap_time_s),
            time_s: Some(time_s),
            stint: Some(1),
            compound: Some("MEDIUM".to_string()),
            track_status: Some("1".to_string()),
            ..Default::default()
        }
    }

    /// Builds a race where every driver laps at a constant pace
    pub(crate) fn constant_pace_race(paces: &[(&str, f64)], laps: u32) -> Session {
        let mut session = Session {
            info: EventInfo {
                year: 2023,
                event_name: "Italian Grand Prix".to_string(),
                location: "Monza".to_string(),
                session_kind: SessionKind::Race,
            },
            ..Default::default()
        };
        for (abbreviation, _) in paces {
            session.drivers.push(driver(abbreviation, "Team", "3671c6"));
        }
        for lap_number in 1..=laps {
            for (abbreviation, pace) in paces {
                session.laps.push(lap(
                    abbreviation,
                    lap_number,
                    *pace,
                    1000. + pace * lap_number as f64,
                ));
            }
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_session_kind_parsing() {
        assert_eq!("R".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("race".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("fp2".parse::<SessionKind>().unwrap(), SessionKind::Practice2);
        assert_eq!(
            "Sprint Qualifying".parse::<SessionKind>().unwrap(),
            SessionKind::SprintQualifying
        );
        assert!("warmup".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_session_kind_display_matches_code() {
        assert_eq!(SessionKind::Qualifying.to_string(), "Q");
        assert_eq!(SessionKind::Practice3.to_string(), "FP3");
    }

    #[test]
    fn test_pick_lap_missing_returns_error() {
        let session = constant_pace_race(&[("VER", 90.)], 3);
        assert!(session.pick_lap("VER", 2).is_ok());
        match session.pick_lap("VER", 10) {
            Err(PitwallError::LapNotFound { driver, lap_number }) => {
                assert_eq!(driver, "VER");
                assert_eq!(lap_number, 10);
            }
            _ => panic!("Expected LapNotFound error"),
        }
    }

    #[test]
    fn test_lap_drivers_keep_first_appearance_order() {
        let session = constant_pace_race(&[("HAM", 91.), ("VER", 90.), ("LEC", 92.)], 2);
        assert_eq!(session.lap_drivers(), vec!["HAM", "VER", "LEC"]);
    }

    #[test]
    fn test_lap_telemetry_sorted_by_time() {
        let mut session = constant_pace_race(&[("VER", 90.)], 1);
        for t in [2.0, 0.5, 1.0] {
            session.car_data.push(CarSample {
                driver: "VER".to_string(),
                lap_number: 1,
                time_s: t,
                ..Default::default()
            });
        }
        let times = session
            .lap_telemetry("VER", 1)
            .iter()
            .map(|s| s.time_s)
            .collect_vec();
        assert_eq!(times, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_records_start_with_event() {
        let session = constant_pace_race(&[("VER", 90.)], 2);
        let records = session.records().collect_vec();
        assert!(matches!(records[0], SessionRecord::Event(_)));
        assert_eq!(records.len(), 1 + 1 + 2);
    }
}
