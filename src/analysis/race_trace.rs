use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use log::debug;

use super::{cumulative_times, leader_laps};
use crate::{PitwallError, session::Session};

/// What the race trace gaps are measured against
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RaceTraceReference {
    /// Mean cumulative time of all drivers on each lap
    #[default]
    Average,
    /// Cumulative time of whoever led each lap
    Leader,
    /// Cumulative time of one driver, by abbreviation
    Driver(String),
}

impl FromStr for RaceTraceReference {
    type Err = PitwallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(PitwallError::InvalidUserInput {
                field: "relative_to".to_string(),
                reason: "reference cannot be empty".to_string(),
            }),
            "average" => Ok(Self::Average),
            "leader" => Ok(Self::Leader),
            _ => Ok(Self::Driver(s.trim().to_uppercase())),
        }
    }
}

impl fmt::Display for RaceTraceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Average => f.write_str("average"),
            Self::Leader => f.write_str("leader"),
            Self::Driver(driver) => f.write_str(driver),
        }
    }
}

impl RaceTraceReference {
    pub fn title(&self) -> String {
        match self {
            Self::Average => "Race Progression Relative to Average".to_string(),
            Self::Leader => "Race Gaps to Leader".to_string(),
            Self::Driver(driver) => format!("Race Gaps Relative to {}", driver),
        }
    }

    pub fn y_label(&self) -> String {
        match self {
            Self::Average => "Time Delta to Average (s)".to_string(),
            Self::Leader => "Gap to Leader (s)".to_string(),
            Self::Driver(driver) => format!("Gap to {} (s)", driver),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaceTraceSeries {
    pub driver: String,
    /// (lap number, gap in seconds) ordered by lap
    pub gaps: Vec<(u32, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaceTrace {
    pub reference: RaceTraceReference,
    pub title: String,
    pub y_label: String,
    pub series: Vec<RaceTraceSeries>,
}

fn reference_times(
    session: &Session,
    reference: &RaceTraceReference,
) -> Result<BTreeMap<u32, f64>, PitwallError> {
    match reference {
        RaceTraceReference::Average => {
            let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
            for lap in cumulative_times(session) {
                if let Some(time) = lap.cumulative_time_s {
                    let entry = sums.entry(lap.lap.lap_number).or_insert((0., 0));
                    entry.0 += time;
                    entry.1 += 1;
                }
            }
            Ok(sums
                .into_iter()
                .map(|(lap_number, (sum, count))| (lap_number, sum / count as f64))
                .collect())
        }
        RaceTraceReference::Leader => Ok(leader_laps(session)
            .into_iter()
            .filter_map(|l| Some((l.lap.lap_number, l.cumulative_time_s?)))
            .collect()),
        RaceTraceReference::Driver(driver) => {
            if !session.laps.iter().any(|l| &l.driver == driver) {
                return Err(PitwallError::DriverNotFound {
                    driver: driver.clone(),
                });
            }
            Ok(cumulative_times(session)
                .into_iter()
                .filter(|l| &l.lap.driver == driver)
                .filter_map(|l| Some((l.lap.lap_number, l.cumulative_time_s?)))
                .collect())
        }
    }
}

/// Gap of each driver's race time to a reference, lap by lap.
///
/// `drivers` defaults to every driver with laps, in order of first appearance.
/// Drivers without laps in the session are skipped.
pub fn race_trace(
    session: &Session,
    reference: &RaceTraceReference,
    drivers: Option<&[String]>,
) -> Result<RaceTrace, PitwallError> {
    let reference_by_lap = reference_times(session, reference)?;

    let mut by_driver: HashMap<&str, Vec<(u32, f64)>> = HashMap::new();
    for lap in cumulative_times(session) {
        let Some(time) = lap.cumulative_time_s else {
            continue;
        };
        if let Some(reference_time) = reference_by_lap.get(&lap.lap.lap_number) {
            by_driver
                .entry(lap.lap.driver.as_str())
                .or_default()
                .push((lap.lap.lap_number, time - reference_time));
        }
    }

    let drivers = match drivers {
        Some(drivers) => drivers.to_vec(),
        None => session.lap_drivers(),
    };
    let series = drivers
        .into_iter()
        .filter_map(|driver| {
            let Some(mut gaps) = by_driver.remove(driver.as_str()) else {
                debug!("No laps for {} in race trace", driver);
                return None;
            };
            gaps.sort_by_key(|(lap_number, _)| *lap_number);
            Some(RaceTraceSeries { driver, gaps })
        })
        .collect();

    Ok(RaceTrace {
        reference: reference.clone(),
        title: reference.title(),
        y_label: reference.y_label(),
        series,
    })
}
