mod app;
mod config;
mod data;
mod extract;
mod state;
mod ui;

use app::LabExtractApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load_or_default(&AppConfig::resolve_path());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Laboratory Extraction",
        options,
        Box::new(move |_cc| Ok(Box::new(LabExtractApp::new(config)))),
    )
}
