/// Photo rendering module
///
/// This module handles:
/// - The filter chain applied to the base image (filter.rs)
/// - Sticker and caption rasterization (glyph.rs)
/// - The compositing pipeline (compositor.rs)
/// - Mapping editor clicks to image pixels (placement.rs)
/// - PNG and data URL encoding (encoding.rs)

pub mod compositor;
pub mod encoding;
pub mod filter;
pub mod glyph;
pub mod placement;

pub use compositor::{compose_in_background, Compositor, DEFAULT_OVERLAY_FONT_SIZE};
pub use placement::{display_to_image, DisplayRect};
