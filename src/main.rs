#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod export;
mod schedule;
mod store;
mod ui;

use directories::ProjectDirs;
use eframe::egui;
use flexi_logger::{Cleanup, Criterion, FileSpec, LoggerHandle, Naming, WriteMode};

/// Rolling file log under the platform data dir. The handle must stay alive
/// for the process lifetime or buffered lines are lost.
fn init_logging() -> Option<LoggerHandle> {
    let dirs = ProjectDirs::from("com", "tempo", "tempo")?;
    let log_dir = dirs.data_dir().join("logs");

    flexi_logger::Logger::try_with_env_or_str("info")
        .ok()?
        .log_to_file(FileSpec::default().directory(log_dir).basename("tempo"))
        .rotate(
            Criterion::Size(5 * 1024 * 1024),
            Naming::Numbers,
            Cleanup::KeepLogFiles(3),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .ok()
}

fn main() -> eframe::Result<()> {
    let _logger = init_logging();
    log::info!("tempo {} starting", env!("CARGO_PKG_VERSION"));

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 900.0])
        .with_min_inner_size([900.0, 700.0])
        .with_title("Tempo");

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Tempo",
        options,
        Box::new(|cc| Ok(Box::new(ui::TempoApp::new(cc)))),
    )
}
