use egui::{Margin, RichText, SidePanel, Ui};

use crate::{
    app::{SessionStatus, TryOnApp},
    theme,
};

impl TryOnApp {
    pub(crate) fn show_controls(&mut self, ctx: &egui::Context) {
        let palette = theme::palette();
        SidePanel::left("tryon_controls")
            .resizable(false)
            .exact_width(260.0)
            .frame(
                egui::Frame::new()
                    .fill(palette.panel)
                    .inner_margin(Margin::same(16)),
            )
            .show(ctx, |ui| {
                ui.heading("Jewelry");
                ui.add_space(4.0);
                self.overlay_inputs(ui, palette);

                ui.separator();
                ui.heading("Camera");
                let mut mirror = self.settings.layout.mirror;
                if ui.checkbox(&mut mirror, "Mirror view").changed() {
                    self.set_mirror(mirror);
                }
                ui.horizontal(|ui| {
                    let active =
                        matches!(self.status, SessionStatus::Starting | SessionStatus::Running);
                    if ui.add_enabled(!active, egui::Button::new("Start")).clicked() {
                        self.start_session();
                    }
                    if ui.add_enabled(active, egui::Button::new("Stop")).clicked() {
                        self.stop_session();
                    }
                });

                ui.add_space(8.0);
                ui.label(
                    RichText::new(format!(
                        "Frames: {}   Faces: {}",
                        self.frames_shown, self.faces_in_view
                    ))
                    .color(palette.subtle_text),
                );
            });
    }

    fn overlay_inputs(&mut self, ui: &mut Ui, palette: theme::Palette) {
        let (earring_ready, necklace_ready) = self.overlays_ready();
        let (earring_error, necklace_error) = self.overlay_errors();

        ui.label("Earring image");
        let earring = ui.text_edit_singleline(&mut self.earring_input);
        load_hint(ui, palette, earring_ready, earring_error.as_deref());

        ui.label("Necklace image");
        let necklace = ui.text_edit_singleline(&mut self.necklace_input);
        load_hint(ui, palette, necklace_ready, necklace_error.as_deref());

        let submitted = (earring.lost_focus() || necklace.lost_focus())
            && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Apply").clicked() || submitted {
            self.apply_overlay_inputs();
        }
    }
}

fn load_hint(ui: &mut Ui, palette: theme::Palette, ready: bool, error: Option<&str>) {
    let (text, color) = match (ready, error) {
        (true, _) => ("Loaded".to_owned(), palette.success),
        (false, Some(err)) => (err.to_owned(), palette.danger),
        (false, None) => ("Loading...".to_owned(), palette.warning),
    };
    ui.label(RichText::new(text).small().color(color));
}
