#![warn(clippy::all, rust_2018_idioms)]

mod app;
mod input;
mod settings;

use settings::Settings;

fn main() -> Result<(), anyhow::Error> {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;
    let extent = settings.grid_extent();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Dijkstra's Algorithm Visualization")
            .with_inner_size([extent + 260.0, extent + 140.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };

    eframe::run_native(
        "gridsearch",
        native_options,
        Box::new(move |cc| Box::new(app::App::new(cc, settings))),
    )
    .map_err(|e| anyhow::anyhow!("window closed with an error: {}", e))
}
