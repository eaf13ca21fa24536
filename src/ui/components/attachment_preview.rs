use crate::ui::images::ImageCache;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::load::SizedTexture;
use egui::{self, RichText, Vec2, WidgetInfo, WidgetType};

const PREVIEW_HEIGHT: f32 = 96.0;

/// Thumbnail of the staged image with a remove control
pub struct AttachmentPreview<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
    images: &'a mut ImageCache,
}

impl<'a> AttachmentPreview<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme, images: &'a mut ImageCache) -> Self {
        Self {
            state,
            theme,
            images,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let Some(preview_url) = self
            .state
            .pending_attachment
            .as_ref()
            .map(|a| a.preview_url.clone())
        else {
            return;
        };

        let mut remove = false;

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    match self.images.texture(ui.ctx(), &preview_url) {
                        Some(texture) => {
                            ui.add(
                                egui::Image::from_texture(SizedTexture::from_handle(&texture))
                                    .max_height(PREVIEW_HEIGHT)
                                    .rounding(self.theme.button_rounding),
                            );
                        }
                        None => {
                            ui.label(RichText::new("🖼 Image").color(self.theme.text_secondary));
                        }
                    }

                    let button = egui::Button::new(RichText::new("✕").size(12.0))
                        .min_size(Vec2::splat(24.0))
                        .rounding(self.theme.button_rounding)
                        .fill(self.theme.recording);
                    let response = ui.add(button);
                    response.widget_info(|| {
                        WidgetInfo::labeled(WidgetType::Button, true, "Remove attachment")
                    });

                    remove = response.clicked();
                    response.on_hover_text("Remove image");
                });
            });

        if remove {
            self.state.clear_attachment();
        }
    }
}
