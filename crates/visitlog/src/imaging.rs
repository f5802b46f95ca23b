//! Photo normalization: bound the pixel dimensions and re-encode as JPEG.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use crate::config::ImageConfig;
use crate::error::ImageError;

pub const JPEG_MIME: &str = "image/jpeg";

/// A photo ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("bytes_len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl NormalizedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME, BASE64.encode(&self.bytes))
    }
}

/// Decodes a `data:image/...;base64,` URL (or bare base64) into raw bytes.
pub fn decode_data_url(data: &str) -> Result<Vec<u8>, ImageError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::DataUrl("missing ',' separator".to_string()))?;
            if !header.starts_with("image/") || !header.ends_with(";base64") {
                return Err(ImageError::DataUrl(format!(
                    "unsupported media header '{}'",
                    header
                )));
            }
            body
        }
        None => data,
    };

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| ImageError::DataUrl(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    Ok(bytes)
}

#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    max_width: u32,
    max_height: u32,
    quality: u8,
}

impl ImageNormalizer {
    /// `quality` is a fraction in `(0, 1]`, mapped onto the JPEG 1..=100 scale.
    pub fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        let quality = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
            quality: quality.max(1),
        }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.max_width, config.max_height, config.quality)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Output dimensions for a `width` x `height` input. The dominant side is
    /// clamped to its bound and the other side scaled to keep the aspect
    /// ratio. Never upscales.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |side: u32, numerator: u32, denominator: u32| -> u32 {
            let scaled = (side as f64 * numerator as f64 / denominator as f64).round() as u32;
            scaled.max(1)
        };

        if width >= height {
            if width > self.max_width {
                return (self.max_width, scale(height, self.max_width, width));
            }
        } else if height > self.max_height {
            return (scale(width, self.max_height, height), self.max_height);
        }
        (width, height)
    }

    pub fn normalize(&self, raw: &[u8]) -> Result<NormalizedImage, ImageError> {
        let _span = tracing::debug_span!("imaging.normalize", input_len = raw.len()).entered();

        if raw.is_empty() {
            return Err(ImageError::Empty);
        }

        let img = image::load_from_memory(raw)
            .map_err(|e| ImageError::Decode(format!("Failed to load photo: {}", e)))?;

        let (width, height) = img.dimensions();
        let (target_width, target_height) = self.target_dimensions(width, height);

        let resized = if (target_width, target_height) == (width, height) {
            img
        } else {
            img.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        let rgb = resized.to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut Cursor::new(&mut bytes), self.quality)
            .encode_image(&rgb)
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        log::debug!(
            "Normalized photo {}x{} -> {}x{} ({} bytes)",
            width,
            height,
            target_width,
            target_height,
            bytes.len()
        );

        Ok(NormalizedImage {
            bytes,
            width: target_width,
            height: target_height,
        })
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::from_config(&ImageConfig::default())
    }
}
