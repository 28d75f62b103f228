// SVG rendering of figures, for exporting charts to files

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use super::{Axes, BoundingBox, Figure, LineStyle, Rgb};
use crate::PitwallError;

const BACKGROUND: Rgb = Rgb::new(12, 12, 12);
const FOREGROUND: Rgb = Rgb::new(220, 220, 220);
const GRID: Rgb = Rgb::new(72, 72, 72);

const FIGURE_TITLE_HEIGHT: f64 = 48.;
const MARGIN_LEFT: f64 = 90.;
const MARGIN_RIGHT: f64 = 170.;
const MARGIN_TOP: f64 = 40.;
const MARGIN_BOTTOM: f64 = 56.;
const TICK_COUNT: usize = 6;
const BAR_HEIGHT: f64 = 0.6;
const LEGEND_ROW_HEIGHT: f64 = 20.;
const MAX_SVG_BYTES: usize = 10_000_000;

/// Pixel rectangle of the drawable area of one axes
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

/// Maps data coordinates into a plot area
#[derive(Debug, Clone, Copy)]
struct Transform {
    area: PlotArea,
    bounds: BoundingBox,
    invert_y: bool,
}

impl Transform {
    fn x(&self, x: f64) -> f64 {
        self.area.left + (x - self.bounds.min_x) / self.bounds.width() * self.area.width
    }

    fn y(&self, y: f64) -> f64 {
        let fraction = (y - self.bounds.min_y) / self.bounds.height();
        if self.invert_y {
            self.area.top + fraction * self.area.height
        } else {
            self.area.top + self.area.height - fraction * self.area.height
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn stroke_attributes(style: &LineStyle, width: f64) -> String {
    let mut attributes = format!(
        r#"stroke="{}" stroke-width="{:.1}" fill="none""#,
        style.color.to_hex(),
        width
    );
    if style.dashed {
        attributes.push_str(r#" stroke-dasharray="8 5""#);
    }
    attributes
}

/// Round tick positions covering `[min, max]`
pub(crate) fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    let range = max - min;
    let scale = max.abs().max(min.abs());
    // a range of a few ulps cannot be split into distinct ticks
    if !range.is_finite() || range <= f64::EPSILON * scale || count < 2 {
        return vec![min];
    }
    let raw_step = range / (count - 1) as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let step = [1., 2., 2.5, 5., 10.]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10. * magnitude);
    let first = (min / step).ceil() * step;
    let steps = ((max - first) / step + 1e-9).floor();
    if !steps.is_finite() || steps < 0. || steps > 2. * count as f64 {
        return vec![min];
    }
    (0..=steps as usize)
        .map(|k| first + k as f64 * step)
        // avoid printing -0
        .map(|tick| if tick.abs() < step * 1e-9 { 0. } else { tick })
        .collect()
}

pub(crate) fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let formatted = format!("{:.2}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Data bounds with some breathing room, categorical axes span one slot per category
fn padded_bounds(axes: &Axes) -> BoundingBox {
    let mut bounds = axes.data_bounds().unwrap_or(BoundingBox {
        min_x: 0.,
        max_x: 1.,
        min_y: 0.,
        max_y: 1.,
    });
    if !axes.y_categories.is_empty() {
        bounds.min_y = -0.5;
        bounds.max_y = axes.y_categories.len() as f64 - 0.5;
    } else {
        let scale = bounds.min_y.abs().max(bounds.max_y.abs());
        let pad = if bounds.height() > f64::EPSILON * scale {
            bounds.height() * 0.05
        } else {
            1.
        };
        bounds.min_y -= pad;
        bounds.max_y += pad;
    }
    if bounds.width() <= 0. {
        bounds.min_x -= 0.5;
        bounds.max_x += 0.5;
    }
    bounds
}

fn render_axes(svg: &mut String, axes: &Axes, area: PlotArea) {
    let transform = Transform {
        area,
        bounds: padded_bounds(axes),
        invert_y: axes.invert_y,
    };
    let bounds = transform.bounds;
    let right = area.left + area.width;
    let bottom = area.top + area.height;

    svg.push_str(&format!(
        "\n  <g class=\"axes\">\n    <clipPath id=\"clip-{top:.0}\"><rect x=\"{:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" /></clipPath>",
        area.left,
        area.width,
        area.height,
        top = area.top,
    ));

    // x ticks, with optional vertical grid lines
    for tick in nice_ticks(bounds.min_x, bounds.max_x, TICK_COUNT) {
        let x = transform.x(tick);
        if axes.grid {
            svg.push_str(&format!(
                "\n    <line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"0.8\" />",
                area.top,
                bottom,
                GRID.to_hex()
            ));
        }
        svg.push_str(&format!(
            "\n    <text x=\"{x:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
            bottom + 16.,
            FOREGROUND.to_hex(),
            format_tick(tick)
        ));
    }

    // y ticks, categorical axes label every slot
    let y_ticks: Vec<(f64, String)> = if axes.y_categories.is_empty() {
        nice_ticks(bounds.min_y, bounds.max_y, TICK_COUNT)
            .into_iter()
            .map(|t| (t, format_tick(t)))
            .collect()
    } else {
        axes.y_categories
            .iter()
            .enumerate()
            .map(|(i, name)| (i as f64, escape(name)))
            .collect()
    };
    for (tick, label) in y_ticks {
        let y = transform.y(tick);
        if axes.grid {
            svg.push_str(&format!(
                "\n    <line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" stroke=\"{}\" stroke-width=\"0.8\" />",
                area.left,
                right,
                GRID.to_hex()
            ));
        }
        svg.push_str(&format!(
            "\n    <text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"12\" text-anchor=\"end\">{}</text>",
            area.left - 8.,
            y + 4.,
            FOREGROUND.to_hex(),
            label
        ));
    }

    svg.push_str(&format!(
        "\n    <g clip-path=\"url(#clip-{:.0})\">",
        area.top
    ));
    for span in &axes.spans {
        let x_start = transform.x(span.x_start);
        let x_end = transform.x(span.x_end);
        svg.push_str(&format!(
            "\n      <rect class=\"span\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"{:.2}\" />",
            x_start.min(x_end),
            area.top,
            (x_end - x_start).abs(),
            area.height,
            span.color.to_hex(),
            span.alpha
        ));
    }

    for bar in &axes.bars {
        let x_start = transform.x(bar.left);
        let x_end = transform.x(bar.left + bar.width);
        let y_a = transform.y(bar.category as f64 - BAR_HEIGHT / 2.);
        let y_b = transform.y(bar.category as f64 + BAR_HEIGHT / 2.);
        svg.push_str(&format!(
            "\n      <rect class=\"bar\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"#000000\" />",
            x_start.min(x_end),
            y_a.min(y_b),
            (x_end - x_start).abs(),
            (y_b - y_a).abs(),
            bar.color.to_hex()
        ));
        if let Some(label) = &bar.label {
            svg.push_str(&format!(
                "\n      <text x=\"{:.2}\" y=\"{:.2}\" fill=\"#000000\" font-size=\"10\" font-weight=\"bold\" text-anchor=\"middle\">{}</text>",
                (x_start + x_end) / 2.,
                (y_a + y_b) / 2. + 4.,
                escape(label)
            ));
        }
    }

    for line in &axes.h_lines {
        let y = transform.y(line.y);
        svg.push_str(&format!(
            "\n      <line x1=\"{:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" {} />",
            area.left,
            right,
            stroke_attributes(&line.style, 1.)
        ));
    }

    for series in &axes.series {
        let mut path = String::new();
        let mut pen_down = false;
        for [x, y] in &series.points {
            if !x.is_finite() || !y.is_finite() {
                pen_down = false;
                continue;
            }
            let command = if pen_down { " L" } else { " M" };
            path.push_str(&format!(
                "{} {:.2},{:.2}",
                command,
                transform.x(*x),
                transform.y(*y)
            ));
            pen_down = true;
        }
        if path.is_empty() {
            debug!("Series {} has no drawable points", series.label);
            continue;
        }
        svg.push_str(&format!(
            "\n      <path class=\"series\" data-label=\"{}\" d=\"{}\" {} />",
            escape(&series.label),
            path.trim_start(),
            stroke_attributes(&series.style, 1.8)
        ));
    }
    svg.push_str("\n    </g>");

    svg.push_str(&format!(
        "\n    <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\" />",
        area.left,
        area.top,
        area.width,
        area.height,
        FOREGROUND.to_hex()
    ));

    if let Some(title) = &axes.title {
        svg.push_str(&format!(
            "\n    <text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"16\" text-anchor=\"middle\">{}</text>",
            area.left + area.width / 2.,
            area.top - 14.,
            FOREGROUND.to_hex(),
            escape(title)
        ));
    }
    if let Some(x_label) = &axes.x_label {
        svg.push_str(&format!(
            "\n    <text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"13\" text-anchor=\"middle\">{}</text>",
            area.left + area.width / 2.,
            bottom + 40.,
            FOREGROUND.to_hex(),
            escape(x_label)
        ));
    }
    if let Some(y_label) = &axes.y_label {
        let x = area.left - 62.;
        let y = area.top + area.height / 2.;
        svg.push_str(&format!(
            "\n    <text x=\"{x:.2}\" y=\"{y:.2}\" fill=\"{}\" font-size=\"13\" text-anchor=\"middle\" transform=\"rotate(-90 {x:.2} {y:.2})\">{}</text>",
            FOREGROUND.to_hex(),
            escape(y_label)
        ));
    }

    if axes.show_legend {
        let x = right + 16.;
        for (row, entry) in axes.legend_entries().iter().enumerate() {
            let y = area.top + 12. + row as f64 * LEGEND_ROW_HEIGHT;
            let style = LineStyle {
                color: entry.color,
                dashed: entry.dashed,
            };
            svg.push_str(&format!(
                "\n    <line x1=\"{x:.2}\" y1=\"{y:.2}\" x2=\"{:.2}\" y2=\"{y:.2}\" {} />",
                x + 24.,
                stroke_attributes(&style, 3.)
            ));
            svg.push_str(&format!(
                "\n    <text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" font-size=\"12\">{}</text>",
                x + 30.,
                y + 4.,
                FOREGROUND.to_hex(),
                escape(&entry.label)
            ));
        }
    }
    svg.push_str("\n  </g>");
}

/// Render a figure as a standalone SVG document
pub fn render_svg(figure: &Figure) -> Result<String, PitwallError> {
    if figure.axes.is_empty() {
        return Err(PitwallError::FigureRenderError {
            reason: "figure has no axes".to_string(),
        });
    }
    if figure.width == 0 || figure.height == 0 {
        return Err(PitwallError::FigureRenderError {
            reason: format!("invalid figure size {}x{}", figure.width, figure.height),
        });
    }

    let width = figure.width as f64;
    let height = figure.height as f64;
    let title_height = if figure.title.is_some() {
        FIGURE_TITLE_HEIGHT
    } else {
        0.
    };
    let slot_height = (height - title_height) / figure.axes.len() as f64;
    let plot_height = slot_height - MARGIN_TOP - MARGIN_BOTTOM;
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    if plot_height <= 0. || plot_width <= 0. {
        return Err(PitwallError::FigureRenderError {
            reason: format!(
                "figure {}x{} is too small for {} axes",
                figure.width,
                figure.height,
                figure.axes.len()
            ),
        });
    }

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" font-family="sans-serif">
  <rect width="100%" height="100%" fill="{}" />"#,
        figure.width,
        figure.height,
        figure.width,
        figure.height,
        BACKGROUND.to_hex()
    ));
    if let Some(title) = &figure.title {
        svg.push_str(&format!(
            "\n  <text x=\"{:.2}\" y=\"32\" fill=\"{}\" font-size=\"20\" text-anchor=\"middle\">{}</text>",
            width / 2.,
            FOREGROUND.to_hex(),
            escape(title)
        ));
    }

    for (i, axes) in figure.axes.iter().enumerate() {
        let area = PlotArea {
            left: MARGIN_LEFT,
            top: title_height + i as f64 * slot_height + MARGIN_TOP,
            width: plot_width,
            height: plot_height,
        };
        if axes.data_bounds().is_none() {
            warn!("Axes {} has nothing to draw", i);
        }
        render_axes(&mut svg, axes, area);
    }
    svg.push_str("\n</svg>");

    if svg.len() > MAX_SVG_BYTES {
        return Err(PitwallError::FigureRenderError {
            reason: format!("Generated SVG too large: {} bytes (max 10MB)", svg.len()),
        });
    }
    Ok(svg)
}

/// Render a figure and write it to `path`
pub fn write_svg(path: &Path, figure: &Figure) -> Result<(), PitwallError> {
    let svg = render_svg(figure)?;
    fs::write(path, svg).map_err(|e| PitwallError::FigureWriteError { source: e })?;
    info!("Wrote figure to {:?}", path);
    Ok(())
}
