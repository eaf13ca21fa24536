//! Main application struct and eframe integration
//!
//! This module contains the main SapApp that implements eframe::App.

use crate::attachment::SystemClipboard;
use crate::audio::{default_recorder, default_speaker};
use crate::backend::BackendPipeline;
use crate::config::ClientConfig;
use crate::ui::components::{AttachmentPreview, InputBar, MessageList};
use crate::ui::images::ImageCache;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::time::Duration;
use tracing::{debug, error, info};

/// How often to check whether speech playback has ended
const PLAYBACK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Main SAP application
pub struct SapApp {
    /// Application state
    state: AppState,
    /// Visual theme
    theme: Theme,
    /// Decoded attachment and message images
    images: ImageCache,
}

impl SapApp {
    /// Create a new SAP application connected to the configured backend
    pub fn new(cc: &eframe::CreationContext<'_>, config: ClientConfig) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let mut state = AppState::new()
            .with_recorder(default_recorder(&config))
            .with_speaker(default_speaker(&config));

        let ctx = cc.egui_ctx.clone();
        match BackendPipeline::new(config)
            .map(|pipeline| pipeline.with_waker(move || ctx.request_repaint()))
            .and_then(|pipeline| pipeline.start_worker())
        {
            Ok(handle) => state = state.with_backend(handle),
            Err(e) => {
                error!("Failed to start backend pipeline: {}", e);
                state.notice = Some(e.user_message());
            }
        }

        match SystemClipboard::new() {
            Ok(clipboard) => state = state.with_clipboard(Box::new(clipboard)),
            Err(e) => debug!("Pasting images disabled: {}", e),
        }

        info!("SAP UI initialized");

        Self {
            state,
            theme,
            images: ImageCache::new(),
        }
    }

    /// Show the top header
    fn show_header(&self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("SAP")
                            .size(40.0)
                            .strong()
                            .color(self.theme.primary),
                    );
                    ui.label(
                        RichText::new("A Localized Ecological Assistant")
                            .size(20.0)
                            .color(self.theme.secondary),
                    );
                });
            });
    }

    /// Show the bottom input area
    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    if let Some(notice) = self.state.notice.clone() {
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(notice).size(12.0).color(self.theme.warning));
                            if ui.small_button("✕").on_hover_text("Dismiss").clicked() {
                                self.state.dismiss_notice();
                            }
                        });
                        ui.add_space(self.theme.spacing_sm);
                    }

                    if self.state.pending_attachment.is_some() {
                        AttachmentPreview::new(&mut self.state, &self.theme, &mut self.images).show(ui);
                        ui.add_space(self.theme.spacing_sm);
                    }

                    InputBar::new(&mut self.state, &self.theme).show(ui);
                });
            });
    }

    /// Show the main content area (message list)
    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(egui::Margin::symmetric(self.theme.spacing_lg, 0.0)),
            )
            .show(ctx, |ui| {
                MessageList::new(&mut self.state, &self.theme, &mut self.images).show(ui);
            });
    }
}

impl eframe::App for SapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll backend events
        self.state.poll_events();
        self.state.poll_playback();

        // Render UI
        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);

        for url in self.state.take_released_images() {
            self.images.forget(&url);
        }

        if self.state.wants_repaint() {
            ctx.request_repaint_after(PLAYBACK_POLL_INTERVAL);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("SAP shutting down");
        self.state.shutdown();
    }
}
