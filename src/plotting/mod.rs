// Backend independent chart description, rendered to SVG or shown in the viewer

pub(crate) mod charts;
pub(crate) mod svg;

use serde::{Deserialize, Serialize};

use crate::PitwallError;
use crate::session::Session;

pub use charts::{
    plot_lap_times, plot_race_trace, plot_rainfall_highlights, plot_telemetry_comparison,
    plot_track_status_highlights, plot_tyre_strategy,
};
pub use svg::{render_svg, write_svg};

pub const DEFAULT_FIGURE_WIDTH: u32 = 1500;
pub const DEFAULT_FIGURE_HEIGHT: u32 = 1000;
/// Height of each stacked axes in multi-channel figures
pub const STACKED_AXES_HEIGHT: u32 = 500;

/// Tyre compound colors, in legend order
pub const COMPOUND_COLORS: [(&str, Rgb); 7] = [
    ("SOFT", Rgb::new(0xda, 0x29, 0x1c)),
    ("MEDIUM", Rgb::new(0xff, 0xd1, 0x2e)),
    ("HARD", Rgb::new(0xf0, 0xf0, 0xec)),
    ("INTERMEDIATE", Rgb::new(0x43, 0xb0, 0x2a)),
    ("WET", Rgb::new(0x00, 0x67, 0xad)),
    ("UNKNOWN", Rgb::new(0x00, 0xff, 0xff)),
    ("TEST_UNKNOWN", Rgb::new(0x43, 0x46, 0x49)),
];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const GREY: Rgb = Rgb::new(128, 128, 128);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses "rrggbb" or "#rrggbb"
    pub fn from_hex(hex: &str) -> Result<Self, PitwallError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || PitwallError::InvalidUserInput {
            field: "color".to_string(),
            reason: format!("'{}' is not a 6 digit hex color", hex),
        };
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub fn compound_color(compound: &str) -> Rgb {
    COMPOUND_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(compound))
        .map(|(_, color)| *color)
        .unwrap_or(Rgb::WHITE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineStyle {
    pub color: Rgb,
    pub dashed: bool,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Rgb::GREY,
            dashed: false,
        }
    }
}

/// Line style for a driver: team color, dashed for every team-mate after the first
pub fn driver_style(session: &Session, abbreviation: &str) -> LineStyle {
    let Some(driver) = session.driver(abbreviation) else {
        return LineStyle::default();
    };
    let color = Rgb::from_hex(&driver.team_color).unwrap_or(Rgb::GREY);
    let team_position = session
        .drivers
        .iter()
        .filter(|d| d.team_name == driver.team_name)
        .position(|d| d.abbreviation == abbreviation)
        .unwrap_or(0);
    LineStyle {
        color,
        dashed: team_position > 0,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<[f64; 2]>,
    pub style: LineStyle,
}

/// Shaded vertical band across the full height of the axes
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub x_start: f64,
    pub x_end: f64,
    pub color: Rgb,
    pub alpha: f32,
}

/// Horizontal bar on a categorical y axis
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    /// Index into `Axes::y_categories`
    pub category: usize,
    pub left: f64,
    pub width: f64,
    pub color: Rgb,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HorizontalLine {
    pub y: f64,
    pub style: LineStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
    pub dashed: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Axes {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub series: Vec<Series>,
    pub spans: Vec<Span>,
    pub bars: Vec<Bar>,
    pub h_lines: Vec<HorizontalLine>,
    /// Explicit legend entries, when empty the series labels are used
    pub legend: Vec<LegendEntry>,
    pub show_legend: bool,
    pub grid: bool,
    /// Draw larger y values lower on the canvas
    pub invert_y: bool,
    /// Labels of a categorical y axis, bar categories index into it
    pub y_categories: Vec<String>,
}

impl Axes {
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        if !self.legend.is_empty() {
            return self.legend.clone();
        }
        self.series
            .iter()
            .map(|s| LegendEntry {
                label: s.label.clone(),
                color: s.style.color,
                dashed: s.style.dashed,
            })
            .collect()
    }

    /// Bounds of everything drawn on the axes, `None` when the axes are empty
    pub fn data_bounds(&self) -> Option<BoundingBox> {
        let mut bbox = BoundingBox::new();
        for series in &self.series {
            for [x, y] in &series.points {
                bbox.update(*x, *y);
            }
        }
        for bar in &self.bars {
            bbox.update(bar.left, bar.category as f64 - 0.5);
            bbox.update(bar.left + bar.width, bar.category as f64 + 0.5);
        }
        for span in &self.spans {
            bbox.update_x(span.x_start);
            bbox.update_x(span.x_end);
        }
        for line in &self.h_lines {
            bbox.update_y(line.y);
        }
        bbox.is_valid().then_some(bbox)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Axes stacked top to bottom
    pub axes: Vec<Axes>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            title: None,
            width,
            height,
            axes: Vec::new(),
        }
    }
}

/// Bounding box of plotted data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Points with a non-finite coordinate are ignored
    pub fn update(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.update_x(x);
            self.update_y(y);
        }
    }

    pub fn update_x(&mut self, x: f64) {
        if x.is_finite() {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
        }
    }

    pub fn update_y(&mut self, y: f64) {
        if y.is_finite() {
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}
