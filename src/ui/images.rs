//! Texture cache for `data:` image URLs
//!
//! Attachments and user images are decoded once and kept on the GPU for as
//! long as the window lives.

use crate::attachment::decode_data_url;
use egui::{ColorImage, TextureHandle, TextureOptions};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tracing::warn;

#[derive(Default)]
pub struct ImageCache {
    /// `None` remembers URLs that failed to decode
    textures: HashMap<u64, Option<TextureHandle>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture for `url`, decoding it on first use
    pub fn texture(&mut self, ctx: &egui::Context, url: &str) -> Option<TextureHandle> {
        let key = url_key(url);
        self.textures
            .entry(key)
            .or_insert_with(|| {
                decode_color_image(url).map(|image| {
                    ctx.load_texture(format!("sap-image-{:x}", key), image, TextureOptions::LINEAR)
                })
            })
            .clone()
    }

    /// Drop the texture for `url` so egui frees it
    pub fn forget(&mut self, url: &str) {
        self.textures.remove(&url_key(url));
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn url_key(url: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    hasher.finish()
}

/// Decode a `data:` URL into pixels egui can upload
pub fn decode_color_image(url: &str) -> Option<ColorImage> {
    let bytes = match decode_data_url(url) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cannot show image: {}", e);
            return None;
        }
    };

    let image = match image::load_from_memory(&bytes) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            warn!("Cannot decode image: {}", e);
            return None;
        }
    };

    let size = [image.width() as usize, image.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, image.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::PendingAttachment;

    #[test]
    fn test_decode_color_image_from_attachment() {
        let attachment = PendingAttachment::from_rgba(3, 2, vec![255; 3 * 2 * 4]).unwrap();
        let image = decode_color_image(&attachment.preview_url).unwrap();
        assert_eq!(image.size, [3, 2]);
    }

    #[test]
    fn test_forget_evicts_texture() {
        let ctx = egui::Context::default();
        let first = PendingAttachment::from_rgba(1, 1, vec![0, 0, 0, 255]).unwrap();
        let second = PendingAttachment::from_rgba(1, 1, vec![255, 255, 255, 255]).unwrap();

        let mut cache = ImageCache::new();
        assert!(cache.texture(&ctx, &first.preview_url).is_some());
        assert!(cache.texture(&ctx, &second.preview_url).is_some());
        assert_eq!(cache.len(), 2);

        cache.forget(&first.preview_url);
        assert_eq!(cache.len(), 1);
        cache.forget(&second.preview_url);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_decode_color_image_rejects_garbage() {
        assert!(decode_color_image("data:image/png;base64,AAAA").is_none());
        assert!(decode_color_image("not a url").is_none());
    }
}
