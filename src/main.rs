mod app;
mod color;
mod state;
mod ui;

use app::SubjectBrowserApp;
use eframe::egui;
use subject_browser::config::Settings;

fn main() -> eframe::Result {
    env_logger::init();

    let settings_path = Settings::default_path();
    log::info!(
        "Settings file: {}",
        settings_path
            .as_deref()
            .map_or_else(|| "<none>".to_string(), |p| p.display().to_string())
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 850.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Subject Browser",
        options,
        Box::new(|_cc| Ok(Box::new(SubjectBrowserApp::new(settings_path)))),
    )
}
