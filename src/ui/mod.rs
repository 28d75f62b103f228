use std::path::PathBuf;

use egui::{Color32, RichText, Vec2, Visuals, style::Widgets};
use log::{error, info};

use crate::PitwallError;
use crate::plotting::{Figure, write_svg};

mod figure_view;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

const MIN_AXES_HEIGHT: f32 = 250.;

/// Interactive window showing a single figure, with zoom, pan and SVG export
pub struct FigureViewerApp {
    figure: Figure,
    last_export: Option<Result<PathBuf, String>>,
}

impl FigureViewerApp {
    pub fn new(figure: Figure, cc: &eframe::CreationContext<'_>) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_MAROON,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_BROWN,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            window_fill: PALETTE_BLACK,
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        Self {
            figure,
            last_export: None,
        }
    }

    fn export_svg(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("SVG image", &["svg"])
            .set_file_name(default_file_name(&self.figure))
            .save_file()
        else {
            return;
        };

        self.last_export = Some(match write_svg(&path, &self.figure) {
            Ok(()) => {
                info!("Figure saved to {}", path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Could not save figure: {}", e);
                Err(e.to_string())
            }
        });
    }
}

impl eframe::App for FigureViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("viewer_top_bar")
            .frame(egui::Frame::new().inner_margin(4))
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    if ui.button("💾 Save SVG").clicked() {
                        self.export_svg();
                    }
                    match &self.last_export {
                        Some(Ok(path)) => {
                            ui.label(
                                RichText::new(format!("Saved {}", path.display()))
                                    .color(Color32::LIGHT_GRAY),
                            );
                        }
                        Some(Err(reason)) => {
                            ui.label(RichText::new(reason).color(PALETTE_ORANGE));
                        }
                        None => {}
                    }
                });
                if let Some(title) = &self.figure.title {
                    ui.vertical_centered(|ui| {
                        ui.heading(RichText::new(title).color(Color32::WHITE));
                    });
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let axes_count = self.figure.axes.len().max(1) as f32;
            let axes_height = (ui.available_height() / axes_count).max(MIN_AXES_HEIGHT);
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (index, axes) in self.figure.axes.iter().enumerate() {
                    figure_view::show_axes(ui, index, axes, axes_height);
                }
            });
        });
    }
}

fn default_file_name(figure: &Figure) -> String {
    let stem = figure
        .title
        .as_deref()
        .map(|title| {
            title
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
                .collect::<String>()
        })
        .filter(|stem| !stem.trim_matches('_').is_empty())
        .unwrap_or_else(|| "figure".to_string());
    format!("{}.svg", stem)
}

/// Opens the figure in a native window and blocks until it is closed
pub fn show_figure(figure: Figure) -> Result<(), PitwallError> {
    if figure.axes.is_empty() {
        return Err(PitwallError::FigureRenderError {
            reason: "figure has no axes".to_string(),
        });
    }

    let window_title = figure
        .title
        .clone()
        .unwrap_or_else(|| "Pitwall".to_string());
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(figure.width as f32, figure.height as f32))
        .with_title(window_title);

    eframe::run_native(
        "Pitwall",
        native_options,
        Box::new(|cc| Ok(Box::new(FigureViewerApp::new(figure, cc)))),
    )
    .map_err(|e| PitwallError::ViewerError {
        reason: e.to_string(),
    })
}
