use egui::{Align2, CentralPanel, CornerRadius, FontId, Sense, Stroke, vec2};

use crate::{app::TryOnApp, theme};

const CANVAS_CORNER_RADIUS: u8 = 8;

impl TryOnApp {
    /// The fixed-size try-on canvas with a thin border and rounded corners.
    pub(crate) fn show_canvas_panel(&mut self, ctx: &egui::Context) {
        let palette = theme::palette();
        let size = vec2(
            self.settings.layout.canvas_width as f32,
            self.settings.layout.canvas_height as f32,
        );

        CentralPanel::default()
            .frame(egui::Frame::new().fill(palette.canvas))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    egui::Frame::new()
                        .stroke(Stroke::new(1.0, palette.outline))
                        .corner_radius(CornerRadius::same(CANVAS_CORNER_RADIUS))
                        .show(ui, |ui| match &self.canvas_texture {
                            Some(texture) => {
                                ui.add(
                                    egui::Image::new(texture)
                                        .fit_to_exact_size(size)
                                        .corner_radius(CornerRadius::same(CANVAS_CORNER_RADIUS)),
                                );
                            }
                            None => {
                                let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
                                ui.painter().text(
                                    rect.center(),
                                    Align2::CENTER_CENTER,
                                    "Start the camera to try on jewelry",
                                    FontId::proportional(16.0),
                                    palette.subtle_text,
                                );
                            }
                        });
                });
            });
    }
}
