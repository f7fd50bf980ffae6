/// Share links and their QR codes
///
/// The public path for a photo is `{base}/share/{token}`. The QR code
/// encodes exactly that URL so a phone camera can open it directly.

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::error::{PhotoboothError, Result};

/// Default QR code edge length in pixels
pub const DEFAULT_QR_SIZE: u32 = 300;

/// Public URL a token resolves under
pub fn share_url(base_url: &str, token: &str) -> String {
    format!("{}/share/{}", base_url.trim_end_matches('/'), token)
}

/// A share URL together with its QR code
#[derive(Debug, Clone)]
pub struct ShareLink {
    pub url: String,
    /// PNG, at least `size` pixels on each side (quiet zone included)
    pub qr_png: Vec<u8>,
}

impl ShareLink {
    pub fn new(base_url: &str, token: &str, size: u32) -> Result<Self> {
        let url = share_url(base_url, token);
        let qr_png = render_qr_png(&url, size)?;
        Ok(Self { url, qr_png })
    }
}

/// Render `data` as a black-on-white QR code PNG
pub fn render_qr_png(data: &str, size: u32) -> Result<Vec<u8>> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| PhotoboothError::QrCode(e.to_string()))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .quiet_zone(true)
        .build();

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PhotoboothError::ImageEncode(e.to_string()))?;
    Ok(buffer.into_inner())
}
