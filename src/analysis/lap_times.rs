use super::TrackStatus;
use crate::session::{LapRecord, Session};

/// Which laps are left out of lap time comparisons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LapTimeFilter {
    /// Skip in-laps and out-laps
    pub ignore_pit_laps: bool,
    /// Skip laps run under a safety car or virtual safety car
    pub ignore_safety_car_laps: bool,
    /// Skip the opening lap
    pub ignore_first_lap: bool,
}

impl Default for LapTimeFilter {
    fn default() -> Self {
        Self {
            ignore_pit_laps: true,
            ignore_safety_car_laps: true,
            ignore_first_lap: true,
        }
    }
}

impl LapTimeFilter {
    pub fn accepts(&self, lap: &LapRecord) -> bool {
        if lap.lap_time_s.is_none() {
            return false;
        }
        if self.ignore_first_lap && lap.lap_number <= 1 {
            return false;
        }
        if self.ignore_safety_car_laps
            && lap
                .track_status
                .as_deref()
                .is_some_and(TrackStatus::is_neutralized)
        {
            return false;
        }
        !(self.ignore_pit_laps && lap.is_pit_lap())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LapTimeSeries {
    pub driver: String,
    /// (lap number, lap time in seconds)
    pub laps: Vec<(u32, f64)>,
}

/// Lap times per driver after applying `filter`.
///
/// `drivers` defaults to the session driver order.
pub fn lap_times(
    session: &Session,
    drivers: Option<&[String]>,
    filter: LapTimeFilter,
) -> Vec<LapTimeSeries> {
    let drivers = match drivers {
        Some(drivers) => drivers.to_vec(),
        None => session.driver_abbreviations(),
    };
    drivers
        .into_iter()
        .map(|driver| {
            let mut laps: Vec<(u32, f64)> = session
                .pick_driver_laps(&driver)
                .filter(|lap| filter.accepts(lap))
                .filter_map(|lap| Some((lap.lap_number, lap.lap_time_s?)))
                .collect();
            laps.sort_by_key(|(lap_number, _)| *lap_number);
            LapTimeSeries { driver, laps }
        })
        .collect()
}
