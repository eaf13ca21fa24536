//! Input bar component
//!
//! Provides attach, paste, record, text input, and send controls.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2, WidgetInfo, WidgetType};
use std::time::Duration;

/// Extensions offered by the file picker
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Input bar component for text, image and voice input
pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        self.handle_paste_shortcut(ui);

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_attach_button(ui);
                    self.show_paste_button(ui);
                    self.show_record_button(ui);

                    ui.add_space(self.theme.spacing_sm);

                    self.show_text_input(ui);

                    self.show_send_button(ui);
                });
            });
    }

    /// Ctrl/Cmd+V anywhere in the window.
    ///
    /// egui only reports the shortcut when the clipboard holds text, so an
    /// image-only clipboard is reached through the paste button.
    fn handle_paste_shortcut(&mut self, ui: &egui::Ui) {
        let pasted = ui.input(|i| {
            i.events.iter().any(|event| match event {
                egui::Event::Paste(_) => true,
                egui::Event::Key {
                    key: Key::V,
                    pressed: true,
                    modifiers,
                    ..
                } => modifiers.command,
                _ => false,
            })
        });
        if pasted {
            self.state.paste_from_clipboard();
        }
    }

    fn show_attach_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(RichText::new("+").size(20.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(self.theme.primary);

        let response = ui.add(button);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, "Attach image"));

        if response.clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Images", IMAGE_EXTENSIONS)
                .pick_file()
            {
                self.state.attach_image(&path);
            }
        }

        response.on_hover_text("Attach an image file");
    }

    fn show_paste_button(&mut self, ui: &mut egui::Ui) {
        let button = egui::Button::new(RichText::new("📋").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(self.theme.primary);

        let response = ui.add(button);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, "Paste image"));

        if response.clicked() {
            self.state.paste_from_clipboard();
        }

        response.on_hover_text("Paste an image from the clipboard");
    }

    fn show_record_button(&mut self, ui: &mut egui::Ui) {
        let is_recording = self.state.is_recording();

        let (icon, tooltip, fill) = if is_recording {
            ("⏹", "Stop recording", self.theme.recording)
        } else {
            ("🎤", "Start recording", self.theme.primary)
        };

        let button = egui::Button::new(RichText::new(icon).size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add(button);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, tooltip));

        let button_rect = response.rect;
        if response.clicked() {
            self.state.toggle_recording();
        }
        response.on_hover_text(tooltip);

        // Show pulsing indicator when recording
        if is_recording {
            let t = ui.ctx().input(|i| i.time);
            let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;

            let painter = ui.painter();
            let center = button_rect.center();
            let radius = button_rect.width() / 2.0 + 2.0 + pulse * 3.0;

            painter.circle_stroke(
                center,
                radius,
                egui::Stroke::new(2.0 * pulse, self.theme.recording.gamma_multiply(1.0 - pulse * 0.5)),
            );

            ui.ctx().request_repaint_after(Duration::from_millis(33));
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let is_transcribing = self.state.is_transcribing();
        let hint = if is_transcribing {
            "Transcribing..."
        } else {
            "Chat..."
        };

        // Reserve space for the spinner and send button
        let reserved = if is_transcribing { 84.0 } else { 56.0 };
        let available_width = (ui.available_width() - reserved).max(80.0);

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text(hint)
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("message_input"));

        let response = ui.add(text_edit);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::TextEdit, true, "Message input"));

        if is_transcribing {
            ui.add(egui::Spinner::new().size(16.0));
        }

        // Enter sends, Shift+Enter does not
        let enter_pressed = ui.input(|i| i.key_pressed(Key::Enter) && !i.modifiers.shift);
        if response.lost_focus() && enter_pressed {
            self.state.submit_text();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send =
            !self.state.input_text.trim().is_empty() || self.state.pending_attachment.is_some();

        let button_color = if can_send {
            self.theme.primary
        } else {
            self.theme.bg_tertiary
        };

        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(button_color);

        let response = ui.add_enabled(can_send, button);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, can_send, "Send message"));

        if response.clicked() {
            self.state.submit_text();
        }

        response.on_hover_text("Send message (Enter)");
    }
}
