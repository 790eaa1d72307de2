//! Global theme customizations for the try-on GUI.

use egui::{Color32, Context, CornerRadius, Margin, Stroke, Visuals};

/// Shared color palette used by the GUI.
#[derive(Clone, Copy)]
pub struct Palette {
    pub canvas: Color32,
    pub panel: Color32,
    pub panel_dark: Color32,
    pub panel_light: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub subtle_text: Color32,
    pub outline: Color32,
}

/// Returns the default palette: warm neutrals with a gold accent.
pub fn palette() -> Palette {
    Palette {
        canvas: Color32::from_rgb(20, 17, 15),
        panel: Color32::from_rgb(34, 30, 27),
        panel_dark: Color32::from_rgb(24, 21, 19),
        panel_light: Color32::from_rgb(58, 51, 45),
        accent: Color32::from_rgb(212, 175, 55),
        success: Color32::from_rgb(120, 200, 150),
        warning: Color32::from_rgb(255, 194, 122),
        danger: Color32::from_rgb(255, 128, 140),
        subtle_text: Color32::from_rgb(210, 200, 188),
        outline: Color32::from_rgb(204, 204, 204),
    }
}

/// Apply the theme to the provided egui context.
pub fn apply(ctx: &Context) {
    let palette = palette();
    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.window_margin = Margin::same(14);
    style.visuals = visuals_from_palette(palette);

    ctx.set_style(style);
}

fn visuals_from_palette(palette: Palette) -> Visuals {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(240, 234, 226));
    visuals.panel_fill = palette.panel;
    visuals.extreme_bg_color = palette.canvas;

    visuals.widgets.noninteractive.bg_fill = palette.panel_dark;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, palette.subtle_text);
    visuals.widgets.inactive.bg_fill = palette.panel_light;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, palette.accent);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, palette.accent);
    visuals.selection.bg_fill = palette.accent;
    visuals.selection.stroke = Stroke::new(1.5, palette.panel_dark);

    visuals.window_corner_radius = CornerRadius::same(12);
    visuals
}
