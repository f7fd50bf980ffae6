/// Display-space to image-space mapping for overlay placement
///
/// The editor shows the canvas scaled to fit the screen, but overlays are
/// stored in base-image pixels. Any error here shows up as stickers
/// drifting between the preview and the saved photo.

use crate::error::{PhotoboothError, Result};
use crate::state::overlay::Point;

/// Bounding rectangle of the displayed canvas, in display units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Map a click at (`client_x`, `client_y`) to base-image pixel coordinates
///
/// `x = (client_x - left) / width * canvas_width`, same for y.
pub fn display_to_image(
    client_x: f32,
    client_y: f32,
    rect: DisplayRect,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<Point> {
    if !(rect.width.is_finite() && rect.width > 0.0 && rect.height.is_finite() && rect.height > 0.0)
    {
        return Err(PhotoboothError::validation(
            "INVALID_PLACEMENT",
            format!("display rect {}x{} is empty", rect.width, rect.height),
        ));
    }
    if !(client_x.is_finite() && client_y.is_finite()) {
        return Err(PhotoboothError::validation(
            "INVALID_PLACEMENT",
            "click position is not finite",
        ));
    }

    let x = (client_x - rect.left) / rect.width * canvas_width as f32;
    let y = (client_y - rect.top) / rect.height * canvas_height as f32;
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_to_center_at_any_display_scale() {
        for (width, height) in [(640.0, 480.0), (320.0, 240.0), (1000.0, 333.0), (17.0, 9.0)] {
            let rect = DisplayRect::new(12.0, 34.0, width, height);
            let p = display_to_image(12.0 + width / 2.0, 34.0 + height / 2.0, rect, 640, 480)
                .unwrap();
            assert_eq!(p, Point::new(320.0, 240.0));
        }
    }

    #[test]
    fn test_scaled_display() {
        // Canvas of 640x480 shown at half size
        let rect = DisplayRect::new(100.0, 50.0, 320.0, 240.0);
        let p = display_to_image(110.0, 170.0, rect, 640, 480).unwrap();
        assert_eq!(p, Point::new(20.0, 240.0));

        let corner = display_to_image(100.0, 50.0, rect, 640, 480).unwrap();
        assert_eq!(corner, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_empty_rect_is_rejected() {
        let rect = DisplayRect::new(0.0, 0.0, 0.0, 240.0);
        let err = display_to_image(1.0, 1.0, rect, 640, 480).unwrap_err();
        assert_eq!(err.code(), "INVALID_PLACEMENT");
    }
}
