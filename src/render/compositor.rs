/// Photo compositor
///
/// Turns (base image, filter parameters, overlays) into the final PNG.
/// Pure computation: no I/O, no shared state, no clock. Each call owns
/// its canvas, so independent photos can be composed concurrently.
///
/// Fixed pipeline:
/// 1. Canvas of the base image's size
/// 2. Filter chain on the base image (brightness, contrast, grayscale, sepia)
/// 3. Filtered base drawn at (0, 0)
/// 4. Filters no longer apply
/// 5. Overlays painted in list order at the overlay font size
/// 6. Canvas encoded as PNG

use image::{imageops, DynamicImage, RgbaImage};
use tokio::task;
use tracing::debug;

use super::encoding::{decode_image, encode_png};
use super::filter::apply_filters;
use super::glyph::{draw_sticker, draw_text};
use crate::error::{PhotoboothError, Result};
use crate::state::edit::FilterParameters;
use crate::state::overlay::{OverlayKind, OverlayList};

/// Overlay glyph size in pixels
pub const DEFAULT_OVERLAY_FONT_SIZE: u32 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    font_size: u32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_FONT_SIZE)
    }
}

impl Compositor {
    pub fn new(font_size: u32) -> Self {
        Self {
            font_size: font_size.max(1),
        }
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    /// Decode, render and encode in one step
    ///
    /// Fails with `ImageDecode` before any drawing if the base image is
    /// unreadable; nothing partial is returned.
    pub fn compose(
        &self,
        base: &[u8],
        filters: &FilterParameters,
        overlays: &OverlayList,
    ) -> Result<Vec<u8>> {
        filters.validate()?;
        let base = decode_image(base)?;
        let canvas = self.render(&base, filters, overlays)?;
        encode_png(&canvas)
    }

    /// Render onto a fresh canvas without encoding
    pub fn render(
        &self,
        base: &DynamicImage,
        filters: &FilterParameters,
        overlays: &OverlayList,
    ) -> Result<RgbaImage> {
        filters.validate()?;

        let (width, height) = (base.width(), base.height());
        if width == 0 || height == 0 {
            return Err(PhotoboothError::ImageDecode(
                "base image has no pixels".to_string(),
            ));
        }

        let mut canvas = RgbaImage::new(width, height);

        let mut filtered = base.to_rgba8();
        apply_filters(&mut filtered, filters);
        imageops::replace(&mut canvas, &filtered, 0, 0);

        for overlay in overlays {
            match &overlay.kind {
                OverlayKind::Sticker { emoji } => {
                    draw_sticker(&mut canvas, overlay.position, self.font_size, emoji)
                }
                OverlayKind::Text { content } => {
                    draw_text(&mut canvas, overlay.position, self.font_size, content)
                }
            }
        }

        debug!(
            width,
            height,
            overlays = overlays.len(),
            filter = %filters.css_filter(),
            "photo composited"
        );
        Ok(canvas)
    }
}

/// Compose on the blocking thread pool
///
/// Compositing is CPU-bound; this keeps it off the async executor.
pub async fn compose_in_background(
    compositor: Compositor,
    base: Vec<u8>,
    filters: FilterParameters,
    overlays: OverlayList,
) -> Result<Vec<u8>> {
    task::spawn_blocking(move || compositor.compose(&base, &filters, &overlays))
        .await
        .map_err(|e| PhotoboothError::ImageEncode(format!("compositing task failed: {}", e)))?
}
