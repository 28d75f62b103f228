use itertools::Itertools;
use log::warn;

use super::leader_laps;
use crate::session::{Session, WeatherSample};

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherByLap {
    pub lap_number: u32,
    /// Weather sample closest in time to the end of the leader's lap
    pub weather: Option<WeatherSample>,
}

/// Index of the sample closest to `time_s` in `samples`, which must be sorted by time.
/// Equidistant samples resolve to the earlier one.
pub(crate) fn nearest_sample(samples: &[WeatherSample], time_s: f64) -> Option<usize> {
    if samples.is_empty() {
        return None;
    }
    // first sample strictly after time_s
    let after = samples.partition_point(|s| s.time_s <= time_s);
    if after == 0 {
        return Some(0);
    }
    if after == samples.len() {
        return Some(samples.len() - 1);
    }
    let before = after - 1;
    if time_s - samples[before].time_s <= samples[after].time_s - time_s {
        Some(before)
    } else {
        Some(after)
    }
}

/// Weather for each lap of the session, seen from the race leader
pub fn get_weather_data_by_lap(session: &Session) -> Vec<WeatherByLap> {
    let weather = session
        .weather
        .iter()
        .cloned()
        .sorted_by(|a, b| a.time_s.total_cmp(&b.time_s))
        .collect_vec();

    leader_laps(session)
        .into_iter()
        .filter_map(|leader| match leader.lap.time_s {
            Some(time_s) => Some((leader.lap.lap_number, time_s)),
            None => {
                warn!(
                    "Leader lap {} has no session time, skipping weather lookup",
                    leader.lap.lap_number
                );
                None
            }
        })
        .sorted_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(lap_number, time_s)| WeatherByLap {
            lap_number,
            weather: nearest_sample(&weather, time_s).map(|i| weather[i].clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::constant_pace_race;
    use proptest::prelude::*;

    fn sample(time_s: f64, rainfall: f32) -> WeatherSample {
        WeatherSample {
            time_s,
            rainfall,
            ..Default::default()
        }
    }

    #[test]
    fn test_nearest_sample_edges() {
        let samples = vec![sample(10., 0.), sample(20., 0.), sample(30., 0.)];
        assert_eq!(nearest_sample(&samples, 0.), Some(0));
        assert_eq!(nearest_sample(&samples, 14.), Some(0));
        assert_eq!(nearest_sample(&samples, 16.), Some(1));
        assert_eq!(nearest_sample(&samples, 100.), Some(2));
        assert_eq!(nearest_sample(&[], 5.), None);
    }

    #[test]
    fn test_nearest_sample_tie_picks_earlier() {
        let samples = vec![sample(10., 0.), sample(20., 0.)];
        assert_eq!(nearest_sample(&samples, 15.), Some(0));
    }

    #[test]
    fn test_weather_by_lap_matches_leader_time() {
        // leader VER finishes laps at 1090, 1180, 1270
        let mut session = constant_pace_race(&[("VER", 90.), ("HAM", 91.)], 3);
        session.weather = vec![sample(1270., 1.5), sample(1000., 0.), sample(1180., 0.4)];

        let by_lap = get_weather_data_by_lap(&session);
        assert_eq!(by_lap.len(), 3);
        assert_eq!(by_lap[0].weather.as_ref().unwrap().time_s, 1000.);
        assert_eq!(by_lap[1].weather.as_ref().unwrap().rainfall, 0.4);
        assert_eq!(by_lap[2].weather.as_ref().unwrap().rainfall, 1.5);
    }

    #[test]
    fn test_weather_by_lap_without_samples() {
        let session = constant_pace_race(&[("VER", 90.)], 2);
        let by_lap = get_weather_data_by_lap(&session);
        assert_eq!(by_lap.len(), 2);
        assert!(by_lap.iter().all(|w| w.weather.is_none()));
    }

    #[test]
    fn test_weather_by_lap_skips_laps_without_time() {
        let mut session = constant_pace_race(&[("VER", 90.)], 2);
        session.laps[0].time_s = None;
        session.weather = vec![sample(0., 0.)];
        let by_lap = get_weather_data_by_lap(&session);
        assert_eq!(by_lap.len(), 1);
        assert_eq!(by_lap[0].lap_number, 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_nearest_sample_minimizes_distance(
            mut times in proptest::collection::vec(0.0f64..10_000.0, 1..50),
            query in 0.0f64..10_000.0,
        ) {
            times.sort_by(|a, b| a.total_cmp(b));
            let samples = times.iter().map(|t| sample(*t, 0.)).collect_vec();
            let chosen = nearest_sample(&samples, query).unwrap();
            let best = times
                .iter()
                .map(|t| (t - query).abs())
                .fold(f64::INFINITY, f64::min);
            prop_assert!(((samples[chosen].time_s - query).abs() - best).abs() < 1e-9);
        }
    }
}
