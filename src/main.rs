mod analysis;
mod app;
mod color;
mod data;
mod export;
mod state;
mod ui;

use app::SalescopeApp;
use data::loader::DataConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DataConfig::from_env();
    log::info!("data directory: {}", config.base_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Salescope – Weekly Sales Predictions",
        options,
        Box::new(|_cc| Ok(Box::new(SalescopeApp::new(config)))),
    )
}
