//! Desktop try-on window.

use std::sync::Arc;

use eframe::NativeOptions;
use log::error;
use tryon_core::{SessionFactories, face_mesh_loader};
use tryon_gui::TryOnApp;
use tryon_utils::{default_settings_path, init_logging};

fn main() -> eframe::Result<()> {
    if let Err(err) = init_logging(log::LevelFilter::Info) {
        eprintln!("failed to initialize logging: {err:#}");
    }

    let mut options = NativeOptions::default();
    options.viewport = options
        .viewport
        .with_inner_size([960.0, 640.0])
        .with_min_inner_size([920.0, 600.0]);

    let loader = Arc::new(face_mesh_loader());
    eframe::run_native(
        "Jewelry Try-On Demo",
        options,
        Box::new(move |cc| {
            let app = TryOnApp::create(&cc.egui_ctx, default_settings_path(), |settings| {
                let model_path = settings.resolved_model_path();
                if !model_path.exists() {
                    error!("Face-mesh model missing at {}", model_path.display());
                }
                SessionFactories::native(model_path, loader)
            });
            Ok(Box::new(app))
        }),
    )
}
