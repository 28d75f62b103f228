// egui_plot rendering of a single figure axes

use egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    GridMark, HLine, Legend, Line, LineStyle as PlotLineStyle, Plot, PlotPoint, PlotPoints,
    Polygon, Text,
};

use crate::plotting::svg::format_tick;
use crate::plotting::{Axes, LineStyle, Rgb};

const LINE_WIDTH: f32 = 1.5;

pub(crate) fn color(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

pub(crate) fn color_with_alpha(rgb: Rgb, alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0., 1.) * 255.).round() as u8;
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

fn plot_line_style(style: &LineStyle) -> PlotLineStyle {
    if style.dashed {
        PlotLineStyle::dashed_loose()
    } else {
        PlotLineStyle::Solid
    }
}

/// egui_plot has no inverted axes, larger values are negated instead
fn flip(invert_y: bool, y: f64) -> f64 {
    if invert_y { -y } else { y }
}

fn plot_y(axes: &Axes, y: f64) -> f64 {
    flip(axes.invert_y, y)
}

/// Tick label for a y grid mark, mapping plot space back to data space
pub(crate) fn y_tick_label(categories: &[String], invert_y: bool, plot_value: f64) -> String {
    // + 0. turns -0 into 0
    let value = flip(invert_y, plot_value) + 0.;
    if categories.is_empty() {
        return format_tick(value);
    }
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0. {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

fn rectangle(x0: f64, x1: f64, y0: f64, y1: f64) -> Vec<[f64; 2]> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
}

/// Legend drawn above the plot for axes that carry explicit entries
fn show_explicit_legend(ui: &mut Ui, axes: &Axes) {
    ui.horizontal_wrapped(|ui| {
        for entry in &axes.legend {
            let marker = if entry.dashed { "╌╌" } else { "■" };
            ui.label(RichText::new(marker).color(color(entry.color)));
            ui.label(RichText::new(&entry.label).color(Color32::WHITE));
        }
    });
}

pub(crate) fn show_axes(ui: &mut Ui, index: usize, axes: &Axes, height: f32) {
    if let Some(title) = &axes.title {
        ui.label(RichText::new(title).color(Color32::WHITE).strong());
    }
    if axes.show_legend && !axes.legend.is_empty() {
        show_explicit_legend(ui, axes);
    }

    let bounds = axes.data_bounds();
    let (y_low, y_high) = match (&bounds, axes.y_categories.is_empty()) {
        (_, false) => (-0.5, axes.y_categories.len() as f64 - 0.5),
        (Some(b), true) => (b.min_y, b.max_y),
        (None, true) => (0., 1.),
    };
    let (span_y0, span_y1) = {
        let a = plot_y(axes, y_low);
        let b = plot_y(axes, y_high);
        (a.min(b), a.max(b))
    };

    let categories = axes.y_categories.clone();
    let invert_y = axes.invert_y;
    let mut plot = Plot::new(("figure_axes", index))
        .height(height)
        .show_background(false)
        .show_grid(axes.grid)
        .y_axis_formatter(move |mark: GridMark, _range| {
            y_tick_label(&categories, invert_y, mark.value)
        });
    if let Some(x_label) = &axes.x_label {
        plot = plot.x_axis_label(x_label.clone());
    }
    if let Some(y_label) = &axes.y_label {
        plot = plot.y_axis_label(y_label.clone());
    }
    if axes.show_legend && axes.legend.is_empty() {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        for span in &axes.spans {
            plot_ui.polygon(
                Polygon::new(
                    "",
                    PlotPoints::new(rectangle(span.x_start, span.x_end, span_y0, span_y1)),
                )
                .fill_color(color_with_alpha(span.color, span.alpha))
                .stroke(Stroke::NONE),
            );
        }

        for bar in &axes.bars {
            let center = plot_y(axes, bar.category as f64);
            plot_ui.polygon(
                Polygon::new(
                    "",
                    PlotPoints::new(rectangle(
                        bar.left,
                        bar.left + bar.width,
                        center - 0.4,
                        center + 0.4,
                    )),
                )
                .fill_color(color(bar.color))
                .stroke(Stroke::new(1., Color32::BLACK)),
            );
            if let Some(label) = &bar.label {
                plot_ui.text(
                    Text::new(
                        "",
                        PlotPoint::new(bar.left + bar.width / 2., center),
                        RichText::new(label).color(Color32::BLACK),
                    ),
                );
            }
        }

        for line in &axes.h_lines {
            plot_ui.hline(
                HLine::new("", plot_y(axes, line.y))
                    .color(color(line.style.color))
                    .style(plot_line_style(&line.style)),
            );
        }

        for series in &axes.series {
            let points: Vec<[f64; 2]> = series
                .points
                .iter()
                .filter(|[x, y]| x.is_finite() && y.is_finite())
                .map(|[x, y]| [*x, plot_y(axes, *y)])
                .collect();
            plot_ui.line(
                Line::new(series.label.clone(), PlotPoints::new(points))
                    .color(color(series.style.color))
                    .style(plot_line_style(&series.style))
                    .width(LINE_WIDTH),
            );
        }
    });
    ui.add_space(8.);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_tick_label_inverted_axes() {
        assert_eq!(y_tick_label(&[], true, -12.), "12");
        assert_eq!(y_tick_label(&[], true, 2.5), "-2.5");
        assert_eq!(y_tick_label(&[], false, 0.25), "0.25");
        assert_eq!(y_tick_label(&[], true, 0.), "0");
    }

    #[test]
    fn test_y_tick_label_categories() {
        let categories = vec!["VER".to_string(), "HAM".to_string()];
        assert_eq!(y_tick_label(&categories, true, 0.), "VER");
        assert_eq!(y_tick_label(&categories, true, -1.), "HAM");
        assert_eq!(y_tick_label(&categories, true, -0.5), "");
        assert_eq!(y_tick_label(&categories, true, -2.), "");
        assert_eq!(y_tick_label(&categories, true, 1.), "");
    }

    #[test]
    fn test_color_with_alpha() {
        let c = color_with_alpha(Rgb::YELLOW, 0.3);
        assert_eq!(c.a(), 77);
        assert_eq!(color_with_alpha(Rgb::BLUE, 2.).a(), 255);
    }
}
