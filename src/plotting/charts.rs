use log::debug;

use super::{
    Axes, Bar, COMPOUND_COLORS, Figure, HorizontalLine, LegendEntry, LineStyle, Rgb, STACKED_AXES_HEIGHT,
    Series, Span, compound_color, driver_style,
};
use crate::analysis::{
    LapTimeFilter, RaceTraceReference, TelemetryChannel, compare_laps, get_track_status_by_lap,
    get_weather_data_by_lap, lap_times, race_trace, tyre_stints,
};
use crate::{PitwallError, session::Session};

const SAFETY_CAR_ALPHA: f32 = 0.3;
const RAINFALL_ALPHA: f32 = 0.2;

fn lap_span(lap_number: u32, color: Rgb, alpha: f32) -> Span {
    Span {
        x_start: lap_number as f64 - 0.5,
        x_end: lap_number as f64 + 0.5,
        color,
        alpha,
    }
}

/// Shades laps run under a safety car (yellow) or virtual safety car (orange)
pub fn plot_track_status_highlights(axes: &mut Axes, session: &Session) {
    let track_status = get_track_status_by_lap(session);
    for lap in track_status.iter().filter(|l| l.is_safety_car()) {
        axes.spans
            .push(lap_span(lap.lap_number, Rgb::YELLOW, SAFETY_CAR_ALPHA));
    }
    for lap in track_status.iter().filter(|l| l.is_virtual_safety_car()) {
        axes.spans
            .push(lap_span(lap.lap_number, Rgb::ORANGE, SAFETY_CAR_ALPHA));
    }
}

/// Shades laps with at least `rainfall_threshold` mm of rain in blue
pub fn plot_rainfall_highlights(axes: &mut Axes, session: &Session, rainfall_threshold: f32) {
    for lap in get_weather_data_by_lap(session) {
        let is_rainy = lap
            .weather
            .as_ref()
            .is_some_and(|w| w.rainfall >= rainfall_threshold);
        if is_rainy {
            axes.spans
                .push(lap_span(lap.lap_number, Rgb::BLUE, RAINFALL_ALPHA));
        }
    }
}

/// Race progression of each driver against `reference`, leader on top
pub fn plot_race_trace(
    session: &Session,
    reference: &RaceTraceReference,
    drivers: Option<&[String]>,
    size: (u32, u32),
) -> Result<Figure, PitwallError> {
    let trace = race_trace(session, reference, drivers)?;

    let mut axes = Axes {
        title: Some(trace.title),
        x_label: Some("Lap Number".to_string()),
        y_label: Some(trace.y_label),
        show_legend: true,
        grid: true,
        invert_y: true,
        ..Default::default()
    };
    plot_track_status_highlights(&mut axes, session);

    for series in trace.series {
        axes.series.push(Series {
            style: driver_style(session, &series.driver),
            points: series
                .gaps
                .iter()
                .map(|(lap, gap)| [*lap as f64, *gap])
                .collect(),
            label: series.driver,
        });
    }

    let mut figure = Figure::new(size.0, size.1);
    figure.axes.push(axes);
    Ok(figure)
}

/// Lap times of each driver, with unrepresentative laps filtered out
pub fn plot_lap_times(
    session: &Session,
    drivers: Option<&[String]>,
    filter: LapTimeFilter,
    size: (u32, u32),
) -> Figure {
    let mut axes = Axes {
        title: Some(format!(
            "{} {} - Lap Times",
            session.info.year, session.info.event_name
        )),
        x_label: Some("Lap Number".to_string()),
        y_label: Some("Lap Time (s)".to_string()),
        show_legend: true,
        grid: true,
        ..Default::default()
    };
    for series in lap_times(session, drivers, filter) {
        axes.series.push(Series {
            style: driver_style(session, &series.driver),
            points: series
                .laps
                .iter()
                .map(|(lap, time)| [*lap as f64, *time])
                .collect(),
            label: series.driver,
        });
    }

    let mut figure = Figure::new(size.0, size.1);
    figure.axes.push(axes);
    figure
}

/// One horizontal bar per tyre stint, drivers listed top to bottom
pub fn plot_tyre_strategy(
    session: &Session,
    drivers: Option<&[String]>,
    size: (u32, u32),
) -> Figure {
    let drivers = match drivers {
        Some(drivers) => drivers.to_vec(),
        None => session.driver_abbreviations(),
    };
    let stints = tyre_stints(session, Some(&drivers));
    debug!("Plotting {} stints for {} drivers", stints.len(), drivers.len());

    let mut axes = Axes {
        title: Some(format!(
            "{} {} - Tyre Strategy",
            session.info.year, session.info.event_name
        )),
        x_label: Some("Lap Number".to_string()),
        y_label: Some("Driver".to_string()),
        show_legend: true,
        grid: false,
        invert_y: true,
        legend: COMPOUND_COLORS
            .iter()
            .map(|(name, color)| LegendEntry {
                label: name.to_string(),
                color: *color,
                dashed: false,
            })
            .collect(),
        ..Default::default()
    };
    for stint in stints {
        let Some(category) = drivers.iter().position(|d| *d == stint.driver) else {
            continue;
        };
        axes.bars.push(Bar {
            category,
            left: stint.first_lap as f64,
            width: stint.length() as f64,
            color: compound_color(&stint.compound),
            label: Some(stint.compound),
        });
    }
    axes.y_categories = drivers;

    let mut figure = Figure::new(size.0, size.1);
    figure.axes.push(axes);
    figure
}

/// Telemetry traces of two laps stacked by channel, sharing the distance axis
pub fn plot_telemetry_comparison(
    session: &Session,
    reference: (&str, u32),
    compare: (&str, u32),
    channels: &[TelemetryChannel],
    width: u32,
) -> Result<Figure, PitwallError> {
    if channels.is_empty() {
        return Err(PitwallError::InvalidUserInput {
            field: "plots".to_string(),
            reason: "at least one telemetry channel is required".to_string(),
        });
    }
    let comparison = compare_laps(session, reference, compare)?;
    let (reference_driver, reference_lap) = reference;
    let (compare_driver, compare_lap) = compare;
    let reference_style = driver_style(session, reference_driver);
    let compare_style = driver_style(session, compare_driver);
    let delta_label = format!(
        "{} ({} to {})",
        TelemetryChannel::TimeDelta.y_label(),
        compare_driver,
        reference_driver
    );

    let mut figure = Figure::new(width, STACKED_AXES_HEIGHT * channels.len() as u32);
    figure.title = Some(format!(
        "Telemetry Comparison: {} Lap {} vs. {} Lap {}",
        reference_driver, reference_lap, compare_driver, compare_lap
    ));

    for channel in channels {
        let mut axes = Axes {
            show_legend: true,
            grid: true,
            ..Default::default()
        };
        match channel {
            TelemetryChannel::TimeDelta => {
                axes.y_label = Some(delta_label.clone());
                axes.series.push(Series {
                    label: delta_label.clone(),
                    points: comparison.delta_points(),
                    style: LineStyle {
                        color: Rgb::WHITE,
                        dashed: false,
                    },
                });
                axes.h_lines.push(HorizontalLine {
                    y: 0.,
                    style: LineStyle {
                        color: Rgb::WHITE,
                        dashed: true,
                    },
                });
            }
            _ => {
                axes.y_label = Some(channel.y_label().to_string());
                axes.series.push(Series {
                    label: format!("{} Lap {}", reference_driver, reference_lap),
                    points: comparison.reference.channel(*channel),
                    style: reference_style,
                });
                axes.series.push(Series {
                    label: format!("{} Lap {}", compare_driver, compare_lap),
                    points: comparison.compare.channel(*channel),
                    style: compare_style,
                });
            }
        }
        figure.axes.push(axes);
    }
    if let Some(last) = figure.axes.last_mut() {
        last.x_label = Some("Distance (m)".to_string());
    }
    Ok(figure)
}
