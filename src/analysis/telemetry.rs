// Lap against lap telemetry comparison

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    PitwallError,
    session::{CarSample, Session},
};

/// Telemetry trace selectable in a lap comparison
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TelemetryChannel {
    Speed,
    Throttle,
    Brake,
    TimeDelta,
}

impl TelemetryChannel {
    pub const DEFAULT_CHANNELS: [TelemetryChannel; 2] = [Self::Speed, Self::TimeDelta];

    /// Axis label, the time delta label is completed with the compared drivers
    pub fn y_label(&self) -> &'static str {
        match self {
            Self::Speed => "Speed (km/h)",
            Self::Throttle => "Throttle (%)",
            Self::Brake => "Brake",
            Self::TimeDelta => "Time Delta",
        }
    }

    pub fn value(&self, sample: &CarSample) -> Option<f64> {
        match self {
            Self::Speed => Some(sample.speed as f64),
            Self::Throttle => Some(sample.throttle as f64),
            Self::Brake => Some(if sample.brake { 1. } else { 0. }),
            Self::TimeDelta => None,
        }
    }
}

impl FromStr for TelemetryChannel {
    type Err = PitwallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "speed" => Ok(Self::Speed),
            "throttle" => Ok(Self::Throttle),
            "brake" => Ok(Self::Brake),
            "timedelta" | "delta" => Ok(Self::TimeDelta),
            _ => Err(PitwallError::InvalidUserInput {
                field: "plots".to_string(),
                reason: format!(
                    "unknown telemetry channel '{}', expected Speed, Throttle, Brake or TimeDelta",
                    s
                ),
            }),
        }
    }
}

impl fmt::Display for TelemetryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Speed => "Speed",
            Self::Throttle => "Throttle",
            Self::Brake => "Brake",
            Self::TimeDelta => "TimeDelta",
        };
        f.write_str(name)
    }
}

/// Telemetry of one lap with a distance value for every sample
#[derive(Clone, Debug, PartialEq)]
pub struct LapTelemetry {
    pub driver: String,
    pub lap_number: u32,
    pub samples: Vec<CarSample>,
    /// Meters from the start of the lap, one per sample
    pub distance: Vec<f64>,
}

impl LapTelemetry {
    pub fn from_session(
        session: &Session,
        driver: &str,
        lap_number: u32,
    ) -> Result<Self, PitwallError> {
        session.pick_lap(driver, lap_number)?;
        let samples = session.lap_telemetry(driver, lap_number);
        if samples.len() < 2 {
            return Err(PitwallError::InsufficientTelemetry {
                driver: driver.to_string(),
                lap_number,
                samples: samples.len(),
            });
        }
        let distance = match samples.iter().map(|s| s.distance_m).collect::<Option<Vec<f64>>>() {
            Some(distance) => distance,
            None => integrate_distance(&samples),
        };
        Ok(Self {
            driver: driver.to_string(),
            lap_number,
            samples,
            distance,
        })
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time_s).collect()
    }

    /// (distance, value) pairs for a channel, empty for `TimeDelta`
    pub fn channel(&self, channel: TelemetryChannel) -> Vec<[f64; 2]> {
        self.samples
            .iter()
            .zip(&self.distance)
            .filter_map(|(sample, distance)| Some([*distance, channel.value(sample)?]))
            .collect()
    }
}

/// Distance driven since lap start, integrated from speed.
///
/// The first step runs from time zero to the first sample.
pub fn integrate_distance(samples: &[CarSample]) -> Vec<f64> {
    let mut previous_time = 0.;
    let mut distance = 0.;
    samples
        .iter()
        .map(|sample| {
            let dt = sample.time_s - previous_time;
            previous_time = sample.time_s;
            distance += sample.speed as f64 / 3.6 * dt;
            distance
        })
        .collect()
}

/// Extends a series by one linearly extrapolated value at each end
fn pad_linear(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let start_step = values[1] - values[0];
    let end_step = values[n - 1] - values[n - 2];
    let mut padded = Vec::with_capacity(n + 2);
    padded.push(values[0] - start_step);
    padded.extend_from_slice(values);
    padded.push(values[n - 1] + end_step);
    padded
}

/// Piecewise linear interpolation of `ys(xs)` at `x`, clamped to the end values.
/// `xs` must be non-decreasing.
pub(crate) fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if x <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return ys[last];
    }
    let upper = xs.partition_point(|v| *v <= x);
    let lower = upper - 1;
    let span = xs[upper] - xs[lower];
    if span == 0. {
        return ys[lower];
    }
    ys[lower] + (ys[upper] - ys[lower]) * (x - xs[lower]) / span
}

/// Time gained or lost by `compare` against `reference` at each reference sample.
///
/// Positive values mean the compared lap is behind at that distance.
pub fn delta_time(reference: &LapTelemetry, compare: &LapTelemetry) -> Result<Vec<f64>, PitwallError> {
    for lap in [reference, compare] {
        if lap.samples.len() < 2 {
            return Err(PitwallError::InsufficientTelemetry {
                driver: lap.driver.clone(),
                lap_number: lap.lap_number,
                samples: lap.samples.len(),
            });
        }
        if lap.distance.len() != lap.samples.len() {
            return Err(PitwallError::InvalidUserInput {
                field: "distance".to_string(),
                reason: format!(
                    "{} lap {} has {} distance values for {} samples",
                    lap.driver,
                    lap.lap_number,
                    lap.distance.len(),
                    lap.samples.len()
                ),
            });
        }
    }
    let compare_time = pad_linear(&compare.times());
    let compare_distance = pad_linear(&compare.distance);

    Ok(reference
        .samples
        .iter()
        .zip(&reference.distance)
        .map(|(sample, distance)| {
            interpolate(*distance, &compare_distance, &compare_time) - sample.time_s
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq)]
pub struct LapComparison {
    pub reference: LapTelemetry,
    pub compare: LapTelemetry,
    /// One value per reference sample, see [`delta_time`]
    pub delta: Vec<f64>,
}

impl LapComparison {
    /// (reference distance, delta) pairs
    pub fn delta_points(&self) -> Vec<[f64; 2]> {
        self.reference
            .distance
            .iter()
            .zip(&self.delta)
            .map(|(d, t)| [*d, *t])
            .collect()
    }
}

pub fn compare_laps(
    session: &Session,
    reference: (&str, u32),
    compare: (&str, u32),
) -> Result<LapComparison, PitwallError> {
    let reference = LapTelemetry::from_session(session, reference.0, reference.1)?;
    let compare = LapTelemetry::from_session(session, compare.0, compare.1)?;
    let delta = delta_time(&reference, &compare)?;
    Ok(LapComparison {
        reference,
        compare,
        delta,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::constant_speed_lap;
    use super::*;
    use crate::session::test_support::constant_pace_race;
    use proptest::prelude::*;

    fn race_with_telemetry() -> Session {
        let mut session = constant_pace_race(&[("VER", 90.), ("HAM", 91.)], 2);
        session
            .car_data
            .extend(constant_speed_lap("VER", 1, 360., 1., 10));
        session
            .car_data
            .extend(constant_speed_lap("HAM", 2, 180., 1., 20));
        session
    }

    #[test]
    fn test_channel_parsing() {
        assert_eq!("speed".parse::<TelemetryChannel>().unwrap(), TelemetryChannel::Speed);
        assert_eq!(
            "time-delta".parse::<TelemetryChannel>().unwrap(),
            TelemetryChannel::TimeDelta
        );
        assert_eq!(
            "TimeDelta".parse::<TelemetryChannel>().unwrap(),
            TelemetryChannel::TimeDelta
        );
        assert!("gear".parse::<TelemetryChannel>().is_err());
    }

    #[test]
    fn test_integrate_distance() {
        // 36 km/h is 10 m/s
        let samples = constant_speed_lap("VER", 1, 36., 0.5, 4);
        let distance = integrate_distance(&samples);
        for (actual, expected) in distance.iter().zip([5., 10., 15., 20.]) {
            assert!((actual - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_interpolate_clamps_and_interpolates() {
        let xs = [0., 10., 20.];
        let ys = [0., 1., 3.];
        assert_eq!(interpolate(-5., &xs, &ys), 0.);
        assert_eq!(interpolate(5., &xs, &ys), 0.5);
        assert_eq!(interpolate(15., &xs, &ys), 2.);
        assert_eq!(interpolate(25., &xs, &ys), 3.);
    }

    #[test]
    fn test_delta_against_slower_lap() {
        let session = race_with_telemetry();
        let comparison = compare_laps(&session, ("VER", 1), ("HAM", 2)).unwrap();
        // VER covers 100 m/s, HAM 50 m/s: at 100*t meters HAM needs 2t seconds
        for (sample, delta) in comparison.reference.samples.iter().zip(&comparison.delta) {
            assert!((delta - sample.time_s).abs() < 1e-9);
        }
        assert_eq!(comparison.delta_points().len(), 10);
    }

    #[test]
    fn test_delta_rejects_mismatched_distance() {
        let session = race_with_telemetry();
        let comparison = compare_laps(&session, ("VER", 1), ("HAM", 2)).unwrap();
        let mut compare = comparison.compare.clone();
        compare.distance.truncate(5);
        assert!(matches!(
            delta_time(&comparison.reference, &compare),
            Err(PitwallError::InvalidUserInput { .. })
        ));
        let mut reference = comparison.reference.clone();
        reference.distance.push(1000.);
        assert!(matches!(
            delta_time(&reference, &comparison.compare),
            Err(PitwallError::InvalidUserInput { .. })
        ));
    }

    #[test]
    fn test_lap_without_telemetry() {
        let session = constant_pace_race(&[("VER", 90.)], 2);
        assert!(matches!(
            compare_laps(&session, ("VER", 1), ("VER", 2)),
            Err(PitwallError::InsufficientTelemetry { samples: 0, .. })
        ));
    }

    #[test]
    fn test_missing_lap() {
        let session = race_with_telemetry();
        assert!(matches!(
            compare_laps(&session, ("VER", 7), ("HAM", 2)),
            Err(PitwallError::LapNotFound { .. })
        ));
    }

    #[test]
    fn test_recorded_distance_is_preferred() {
        let mut session = race_with_telemetry();
        for (i, sample) in session
            .car_data
            .iter_mut()
            .filter(|s| s.driver == "VER")
            .enumerate()
        {
            sample.distance_m = Some(i as f64);
        }
        let lap = LapTelemetry::from_session(&session, "VER", 1).unwrap();
        assert_eq!(lap.distance[3], 3.);
        assert_eq!(lap.channel(TelemetryChannel::Speed)[3], [3., 360.]);
        assert!(lap.channel(TelemetryChannel::TimeDelta).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_delta_against_itself_is_zero(
            speeds in proptest::collection::vec(50.0f32..340.0, 2..100),
        ) {
            let samples: Vec<CarSample> = speeds
                .iter()
                .enumerate()
                .map(|(i, speed)| CarSample {
                    driver: "VER".to_string(),
                    lap_number: 1,
                    time_s: (i + 1) as f64 * 0.25,
                    speed: *speed,
                    ..Default::default()
                })
                .collect();
            let lap = LapTelemetry {
                driver: "VER".to_string(),
                lap_number: 1,
                distance: integrate_distance(&samples),
                samples,
            };
            let delta = delta_time(&lap, &lap).unwrap();
            for d in delta {
                prop_assert!(d.abs() < 1e-6);
            }
        }
    }
}
