//! Image attachments staged for the next outgoing message
//!
//! Images come from a picked file or from the clipboard. Both end up as a
//! base64 payload for the backend and a `data:` URL for local previews.

use crate::{Result, SapError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Image waiting to be sent with the next message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    /// Raw base64 payload, no `data:` prefix
    pub base64: String,
    /// `data:<media_type>;base64,<payload>`
    pub preview_url: String,
    /// `image/png`, `image/jpeg`, ...
    pub media_type: String,
}

/// Raw pixels read from the system clipboard
#[derive(Debug, Clone)]
pub struct ClipboardImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8
    pub rgba: Vec<u8>,
}

impl PendingAttachment {
    /// Build an attachment from encoded image bytes.
    ///
    /// `declared_type` is the media type reported by the source (file
    /// extension, clipboard). When absent the bytes are sniffed.
    pub fn from_bytes(bytes: &[u8], declared_type: Option<&str>) -> Result<Self> {
        let media_type = match declared_type {
            Some(media_type) => media_type.to_ascii_lowercase(),
            None => sniff_media_type(bytes)
                .ok_or_else(|| SapError::UnsupportedMedia("unrecognized content".to_string()))?,
        };

        if !media_type.starts_with("image/") {
            return Err(SapError::UnsupportedMedia(media_type));
        }

        let base64 = STANDARD.encode(bytes);
        let preview_url = format!("data:{};base64,{}", media_type, base64);

        Ok(Self {
            base64,
            preview_url,
            media_type,
        })
    }

    /// Read an image file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let declared = ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type().to_string());

        // Extensions that are not images at all are refused before reading
        if declared.is_none() && has_extension(path) {
            return Err(SapError::UnsupportedMedia(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes from {:?}", bytes.len(), path);
        Self::from_bytes(&bytes, declared.as_deref())
    }

    /// Encode raw RGBA clipboard pixels as PNG
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            SapError::UnsupportedMedia(format!("pixel buffer does not match {}x{}", width, height))
        })?;

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| SapError::UnsupportedMedia(format!("PNG encoding failed: {}", e)))?;

        Self::from_bytes(png.get_ref(), Some("image/png"))
    }
}

/// Source of pasted images
pub trait ImageClipboard {
    /// Current clipboard image, `None` when the clipboard holds no image
    fn image(&mut self) -> Result<Option<ClipboardImage>>;
}

/// The operating system clipboard
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| SapError::IOError(format!("Clipboard unavailable: {}", e)))?;
        Ok(Self { clipboard })
    }
}

impl ImageClipboard for SystemClipboard {
    fn image(&mut self) -> Result<Option<ClipboardImage>> {
        match self.clipboard.get_image() {
            Ok(image) => Ok(Some(ClipboardImage {
                width: image.width as u32,
                height: image.height as u32,
                rgba: image.bytes.into_owned(),
            })),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(SapError::IOError(format!("Clipboard read failed: {}", e))),
        }
    }
}

fn has_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| !ext.is_empty())
}

fn sniff_media_type(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

/// Decode the payload of a `data:...;base64,` URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| SapError::UnsupportedMedia("not a base64 data URL".to_string()))?;

    STANDARD
        .decode(payload)
        .map_err(|e| SapError::UnsupportedMedia(format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([10, 200, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniffs_png_without_declared_type() {
        let attachment = PendingAttachment::from_bytes(&tiny_png(), None).unwrap();
        assert_eq!(attachment.media_type, "image/png");
        assert!(attachment.preview_url.starts_with("data:image/png;base64,"));
        assert!(attachment.preview_url.ends_with(&attachment.base64));
    }

    #[test]
    fn test_rejects_non_image_media_type() {
        let result = PendingAttachment::from_bytes(b"%PDF-1.7", Some("application/pdf"));
        assert!(matches!(result, Err(SapError::UnsupportedMedia(_))));
    }

    #[test]
    fn test_rejects_unrecognized_bytes() {
        let result = PendingAttachment::from_bytes(b"just some text", None);
        assert!(matches!(result, Err(SapError::UnsupportedMedia(_))));
    }

    #[test]
    fn test_from_rgba_produces_png() {
        let attachment = PendingAttachment::from_rgba(1, 1, vec![0, 0, 0, 255]).unwrap();
        assert_eq!(attachment.media_type, "image/png");

        let decoded = decode_data_url(&attachment.preview_url).unwrap();
        assert_eq!(image::guess_format(&decoded).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_from_rgba_rejects_short_buffer() {
        assert!(PendingAttachment::from_rgba(4, 4, vec![0; 8]).is_err());
    }

    #[test]
    fn test_decode_data_url_rejects_plain_urls() {
        assert!(decode_data_url("https://example.com/leaf.png").is_err());
    }
}
