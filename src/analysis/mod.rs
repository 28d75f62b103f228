// Lap-by-lap race context derived from a loaded session

pub(crate) mod lap_times;
pub(crate) mod race_trace;
pub(crate) mod stints;
pub(crate) mod telemetry;
pub(crate) mod track_status;
pub(crate) mod weather;

use std::collections::{BTreeMap, HashMap};

use crate::session::{LapRecord, Session};

pub use lap_times::{LapTimeFilter, LapTimeSeries, lap_times};
pub use race_trace::{RaceTrace, RaceTraceReference, RaceTraceSeries, race_trace};
pub use stints::{Stint, tyre_stints};
pub use telemetry::{
    LapComparison, LapTelemetry, TelemetryChannel, compare_laps, delta_time, integrate_distance,
};
pub use track_status::{TrackStatus, TrackStatusByLap, get_track_status_by_lap};
pub use weather::{WeatherByLap, get_weather_data_by_lap};

/// A lap together with the driver's running race time at the end of it
#[derive(Clone, Debug, PartialEq)]
pub struct CumulativeLap<'s> {
    pub lap: &'s LapRecord,
    /// Sum of the driver's known lap times up to and including this lap
    pub cumulative_time_s: Option<f64>,
}

/// Running sum of lap times per driver, in session lap order.
///
/// A lap without a lap time has no cumulative time, later laps keep summing the
/// known lap times.
pub fn cumulative_times(session: &Session) -> Vec<CumulativeLap<'_>> {
    let mut running: HashMap<&str, f64> = HashMap::new();
    session
        .laps
        .iter()
        .map(|lap| {
            let cumulative_time_s = lap.lap_time_s.map(|lap_time| {
                let total = running.entry(lap.driver.as_str()).or_insert(0.);
                *total += lap_time;
                *total
            });
            CumulativeLap {
                lap,
                cumulative_time_s,
            }
        })
        .collect()
}

/// For each lap number, the lap of the driver with the lowest cumulative time.
///
/// Ties go to the lap that comes first in the session. Lap numbers where no
/// driver has a cumulative time are left out.
pub fn leader_laps(session: &Session) -> Vec<CumulativeLap<'_>> {
    let mut leaders: BTreeMap<u32, CumulativeLap<'_>> = BTreeMap::new();
    for lap in cumulative_times(session) {
        let Some(time) = lap.cumulative_time_s else {
            continue;
        };
        let is_new_leader = leaders
            .get(&lap.lap.lap_number)
            .and_then(|leader| leader.cumulative_time_s)
            .is_none_or(|leader_time| time < leader_time);
        if is_new_leader {
            leaders.insert(lap.lap.lap_number, lap);
        }
    }
    leaders.into_values().collect()
}
