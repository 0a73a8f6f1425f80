#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::NativeOptions;
use template_clicker::gui::{ClickerApp, WINDOW_SIZE};
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("template_clicker=info")),
        )
        .init();

    let mut options = NativeOptions::default();
    options.viewport.inner_size = Some(WINDOW_SIZE);
    options.viewport.min_inner_size = Some(egui::vec2(420.0, 420.0));
    options.viewport.transparent = Some(true);

    eframe::run_native(
        "Template Clicker",
        options,
        Box::new(|cc| Box::new(ClickerApp::new(cc))),
    )
}
