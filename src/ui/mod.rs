//! GUI implementation with egui/eframe
//!
//! This module provides the desktop chat window for SAP using the eframe framework.

mod app;
pub mod components;
pub mod images;
mod state;
mod theme;

pub use app::SapApp;
pub use images::ImageCache;
pub use state::{AppState, RecordingState, BACKEND_ERROR_MESSAGE};
pub use theme::Theme;

use crate::config::ClientConfig;

/// Run the SAP application
pub fn run(config: ClientConfig) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([560.0, 420.0])
            .with_title("SAP - A Localized Ecological Assistant"),
        ..Default::default()
    };

    eframe::run_native(
        "SAP",
        options,
        Box::new(|cc| Ok(Box::new(SapApp::new(cc, config)))),
    )
}
