use egui::{Align, Layout, Margin, RichText, Stroke, TopBottomPanel, Ui};

use crate::{
    app::{SessionStatus, TryOnApp},
    theme,
};

impl TryOnApp {
    pub(crate) fn show_header(&mut self, ctx: &egui::Context) {
        let palette = theme::palette();
        TopBottomPanel::top("tryon_header")
            .frame(
                egui::Frame::new()
                    .fill(palette.panel_dark)
                    .stroke(Stroke::new(1.0, palette.panel_light))
                    .inner_margin(Margin::symmetric(20, 14)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Jewelry Try-On Demo").size(24.0).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        self.draw_status_badge(ui, palette);
                    });
                });
                ui.label(RichText::new(&self.status_line).color(palette.subtle_text));
                if let Some(err) = &self.last_error {
                    ui.colored_label(palette.danger, err);
                }
            });
    }

    fn draw_status_badge(&self, ui: &mut Ui, palette: theme::Palette) {
        let (label, color) = match self.status {
            SessionStatus::Idle => ("Idle", palette.subtle_text),
            SessionStatus::Starting => ("Starting...", palette.warning),
            SessionStatus::Running => ("Live", palette.success),
            SessionStatus::Error => ("Error", palette.danger),
        };
        ui.label(RichText::new(label).color(color).strong());
    }
}
