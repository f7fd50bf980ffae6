/// Pixel filter chain for the base image
///
/// Applies the filter parameters in a fixed order:
/// brightness → contrast → grayscale → sepia.
/// The color matrices are the ones the CSS filter functions use
/// (Filter Effects Module, amount = 100%), so a browser preview and the
/// saved image agree.

use image::{Rgba, RgbaImage};

use crate::state::edit::{FilterParameters, PERCENT_IDENTITY};

/// grayscale(100%): every channel becomes Rec. 709 luma
const GRAYSCALE: [[f32; 3]; 3] = [
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
    [0.2126, 0.7152, 0.0722],
];

/// sepia(100%)
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Apply the filter chain in place. Alpha is left untouched.
pub fn apply_filters(image: &mut RgbaImage, params: &FilterParameters) {
    if params.is_identity() {
        return;
    }

    let tone = tone_curve(params);

    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let mut rgb = [tone[r as usize], tone[g as usize], tone[b as usize]];

        if params.grayscale {
            rgb = apply_matrix(&GRAYSCALE, rgb);
        }
        if params.sepia {
            rgb = apply_matrix(&SEPIA, rgb);
        }

        *pixel = Rgba([quantize(rgb[0]), quantize(rgb[1]), quantize(rgb[2]), a]);
    }
}

/// Brightness then contrast, precomputed for every 8-bit input
///
/// Each step clamps to [0, 1] before the next one runs.
fn tone_curve(params: &FilterParameters) -> [f32; 256] {
    let brightness = params.brightness / 100.0;
    let contrast = params.contrast / 100.0;

    let mut curve = [0.0f32; 256];
    for (i, slot) in curve.iter_mut().enumerate() {
        let mut v = i as f32 / 255.0;
        if params.brightness != PERCENT_IDENTITY {
            v = (v * brightness).clamp(0.0, 1.0);
        }
        if params.contrast != PERCENT_IDENTITY {
            v = ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
        }
        *slot = v;
    }
    curve
}

#[inline]
fn apply_matrix(m: &[[f32; 3]; 3], rgb: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for (row, value) in m.iter().zip(out.iter_mut()) {
        *value = (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]).clamp(0.0, 1.0);
    }
    out
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swatch() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, y| {
            Rgba([(x * 60) as u8, (y * 120 + 10) as u8, 200 - (x * 40) as u8, 255 - (x * 10) as u8])
        })
    }

    fn filtered(params: FilterParameters) -> RgbaImage {
        let mut image = swatch();
        apply_filters(&mut image, &params);
        image
    }

    #[test]
    fn test_identity_is_lossless() {
        assert_eq!(filtered(FilterParameters::default()), swatch());
    }

    #[test]
    fn test_identity_tone_curve_round_trips_every_level() {
        let tone = tone_curve(&FilterParameters::default());
        for level in 0..=255u8 {
            assert_eq!(quantize(tone[level as usize]), level);
        }
    }

    #[test]
    fn test_brightness_scales_linearly() {
        let params = FilterParameters::try_new(50.0, 100.0, false, false).unwrap();
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 255]));
        apply_filters(&mut image, &params);
        assert_eq!(image.get_pixel(0, 0), &Rgba([100, 50, 0, 255]));

        let dark = FilterParameters::try_new(0.0, 100.0, false, false).unwrap();
        assert!(filtered(dark).pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }

    #[test]
    fn test_zero_contrast_is_mid_gray() {
        let params = FilterParameters::try_new(100.0, 0.0, false, false).unwrap();
        assert!(filtered(params).pixels().all(|p| p[0] == 128 && p[1] == 128 && p[2] == 128));
    }

    #[test]
    fn test_grayscale_equalizes_channels_and_keeps_alpha() {
        let params = FilterParameters::try_new(100.0, 100.0, true, false).unwrap();
        let out = filtered(params);
        for (before, after) in swatch().pixels().zip(out.pixels()) {
            assert_eq!(after[0], after[1]);
            assert_eq!(after[1], after[2]);
            assert_eq!(after[3], before[3]);
        }
    }

    #[test]
    fn test_sepia_runs_after_grayscale() {
        let both = filtered(FilterParameters::try_new(100.0, 100.0, true, true).unwrap());
        let sepia_only = filtered(FilterParameters::try_new(100.0, 100.0, false, true).unwrap());
        assert_ne!(both, sepia_only);

        // Same result as running the two passes by hand in that order
        let mut staged = swatch();
        apply_filters(
            &mut staged,
            &FilterParameters::try_new(100.0, 100.0, true, false).unwrap(),
        );
        apply_filters(
            &mut staged,
            &FilterParameters::try_new(100.0, 100.0, false, true).unwrap(),
        );
        for (a, b) in both.pixels().zip(staged.pixels()) {
            for c in 0..3 {
                assert!((a[c] as i16 - b[c] as i16).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_sepia_warms_gray() {
        let params = FilterParameters::try_new(100.0, 100.0, false, true).unwrap();
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        apply_filters(&mut image, &params);
        let p = image.get_pixel(0, 0);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }
}
