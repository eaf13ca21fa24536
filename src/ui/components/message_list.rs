//! Message list component
//!
//! Displays the transcript, the thinking bubble, and keeps the newest entry in view.

use crate::messages::Message;
use crate::ui::components::ThinkingIndicator;
use crate::ui::images::ImageCache;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::load::SizedTexture;
use egui::{self, Align, Color32, RichText, Vec2, WidgetInfo, WidgetType};

/// Largest width of an image inside a bubble
const BUBBLE_IMAGE_WIDTH: f32 = 192.0;

/// Message list component
pub struct MessageList<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
    images: &'a mut ImageCache,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme, images: &'a mut ImageCache) -> Self {
        Self {
            state,
            theme,
            images,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let MessageList {
            state,
            theme,
            images,
        } = self;
        let scroll_to_end = state.take_scroll_request();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(theme.spacing);

                    if state.transcript.is_empty() && !state.is_thinking() {
                        show_empty_state(ui, theme);
                    } else {
                        let mut replay = None;
                        for (index, message) in state.transcript.iter().enumerate() {
                            let is_playing = state.playing == Some(index);
                            if show_message(ui, theme, images, index, message, is_playing) {
                                replay = Some(index);
                            }
                            ui.add_space(theme.spacing_sm);
                        }

                        if state.is_thinking() {
                            ThinkingIndicator::new(theme).show(ui);
                        }

                        if let Some(index) = replay {
                            state.replay_or_stop(index);
                        }
                    }

                    ui.add_space(theme.spacing);

                    if scroll_to_end {
                        ui.scroll_to_cursor(Some(Align::BOTTOM));
                    }
                });
            });
    }
}

fn show_empty_state(ui: &mut egui::Ui, theme: &Theme) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);

        ui.label(
            RichText::new("Ask SAP about plants")
                .size(20.0)
                .color(theme.text_primary),
        );

        ui.add_space(theme.spacing_sm);

        ui.label(
            RichText::new("Type a question, record your voice, or paste a photo of a plant.")
                .size(14.0)
                .color(theme.text_muted),
        );
    });
}

/// Draw one bubble. Returns true when its speaker button was clicked.
fn show_message(
    ui: &mut egui::Ui,
    theme: &Theme,
    images: &mut ImageCache,
    index: usize,
    message: &Message,
    is_playing: bool,
) -> bool {
    let is_user = message.is_user();
    let bubble_color = if is_user {
        theme.user_bubble
    } else {
        theme.assistant_bubble
    };
    let text_color = if is_user {
        Color32::WHITE
    } else {
        theme.text_primary
    };

    // Align messages based on sender
    let align = if is_user { Align::RIGHT } else { Align::LEFT };
    let mut replay_clicked = false;

    ui.with_layout(egui::Layout::top_down(align), |ui| {
        ui.label(
            RichText::new(if is_user { "You" } else { "SAP" })
                .size(12.0)
                .color(theme.text_muted),
        );

        ui.add_space(2.0);

        let max_width = ui.available_width() * 0.55;

        egui::Frame::none()
            .fill(bubble_color)
            .rounding(theme.bubble_rounding)
            .inner_margin(egui::Margin::symmetric(14.0, 10.0))
            .show(ui, |ui| {
                ui.set_max_width(max_width);

                if let Some(url) = &message.image {
                    if let Some(texture) = images.texture(ui.ctx(), url) {
                        ui.add(
                            egui::Image::from_texture(SizedTexture::from_handle(&texture))
                                .max_width(BUBBLE_IMAGE_WIDTH)
                                .rounding(theme.card_rounding),
                        );
                        ui.add_space(theme.spacing_sm);
                    }
                }

                let a11y_label = if is_user {
                    format!("User message: {}", message.text)
                } else {
                    format!("Assistant message: {}", message.text)
                };
                let response = ui.label(RichText::new(&message.text).color(text_color));
                response.widget_info(|| WidgetInfo::labeled(WidgetType::Label, true, &a11y_label));
            });

        if !is_user {
            let (icon, tooltip) = if is_playing {
                ("🔇", "Stop")
            } else {
                ("🔊", "Play")
            };

            let button = egui::Button::new(RichText::new(icon).size(16.0).color(Color32::WHITE))
                .min_size(Vec2::splat(32.0))
                .rounding(theme.button_rounding)
                .fill(if is_playing {
                    theme.secondary
                } else {
                    theme.primary.gamma_multiply(0.7)
                });

            let response = ui.add(button);
            let a11y_label = if is_playing {
                format!("Stop message {}", index)
            } else {
                format!("Play message {}", index)
            };
            response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, true, &a11y_label));

            replay_clicked = response.clicked();
            response.on_hover_text(tooltip);
        }

        let time_str = message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M")
            .to_string();
        ui.label(RichText::new(time_str).size(10.0).color(theme.text_muted));
    });

    replay_clicked
}
