use crate::ui::theme::Theme;
use egui::{self, RichText, WidgetInfo, WidgetType};
use std::time::Duration;

/// Repaint interval for the pulse animation
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Three pulsing dots in an assistant bubble
pub struct ThinkingIndicator<'a> {
    theme: &'a Theme,
}

impl<'a> ThinkingIndicator<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let theme = self.theme;

        ui.with_layout(egui::Layout::top_down(egui::Align::LEFT), |ui| {
            let response = egui::Frame::none()
                .fill(theme.assistant_bubble)
                .rounding(theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(14.0, 10.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let t = ui.ctx().input(|i| i.time);
                        for i in 0..3 {
                            let alpha = ((t * 4.0 - i as f64 * 0.6).sin() * 0.5 + 0.5) as f32;
                            ui.label(
                                RichText::new("●")
                                    .size(10.0)
                                    .color(theme.text_secondary.gamma_multiply(0.3 + 0.7 * alpha)),
                            );
                        }
                    });
                })
                .response;

            response.widget_info(|| {
                WidgetInfo::labeled(WidgetType::Label, true, "Assistant is thinking")
            });
        });

        ui.ctx().request_repaint_after(FRAME_INTERVAL);
    }
}
