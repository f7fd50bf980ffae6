/// Raster encoding helpers
///
/// Base images arrive as encoded bytes (PNG/JPEG from the camera, or a
/// `data:` URL from a browser). Final images leave as PNG, which is
/// lossless and deterministic for identical pixels.

use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::error::{PhotoboothError, Result};

pub const PNG_MIME: &str = "image/png";

/// Decode an encoded image (format is sniffed from the bytes)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| PhotoboothError::ImageDecode(e.to_string()))
}

/// Encode a canvas as PNG
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    canvas
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PhotoboothError::ImageEncode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Build a `data:<mime>;base64,...` URL
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, b64)
}

/// Split a base64 `data:` URL into its mime type and payload
pub fn from_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PhotoboothError::ImageDecode("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoboothError::ImageDecode("data URL has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoboothError::ImageDecode("data URL is not base64".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PhotoboothError::ImageDecode(format!("bad base64 payload: {}", e)))?;

    Ok((mime.to_string(), bytes))
}
