/// Filter parameters applied to the base image
///
/// This struct stores the complete filter state of one photo.
/// It is serialized to JSON and stored next to the final image,
/// so a saved photo can be redisplayed or audited without re-rendering.

use serde::{Deserialize, Serialize};

use crate::error::{PhotoboothError, Result};

/// Lower bound for brightness and contrast, in percent
pub const PERCENT_MIN: f32 = 0.0;
/// Upper bound for brightness and contrast, in percent
pub const PERCENT_MAX: f32 = 200.0;
/// Identity value for brightness and contrast
pub const PERCENT_IDENTITY: f32 = 100.0;

/// All filter parameters for a photo
///
/// Every field is always present: a stored snapshot missing any of them
/// is rejected at deserialization instead of being half-applied at render
/// time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterParameters {
    // ========== Tone ==========

    /// Brightness in percent (0.0 to 200.0)
    /// - Scales every sample intensity linearly
    /// - 100.0 = no adjustment
    pub brightness: f32,

    /// Contrast in percent (0.0 to 200.0)
    /// - Scales sample distance from mid-gray
    /// - 100.0 = no adjustment
    pub contrast: f32,

    // ========== Color ==========

    /// Full grayscale conversion
    pub grayscale: bool,

    /// Full sepia toning, applied after grayscale
    pub sepia: bool,
}

impl Default for FilterParameters {
    /// Identity filter (no adjustments)
    fn default() -> Self {
        Self {
            brightness: PERCENT_IDENTITY,
            contrast: PERCENT_IDENTITY,
            grayscale: false,
            sepia: false,
        }
    }
}

impl FilterParameters {
    /// Create identity filter parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate in one step
    pub fn try_new(brightness: f32, contrast: f32, grayscale: bool, sepia: bool) -> Result<Self> {
        let params = Self {
            brightness,
            contrast,
            grayscale,
            sepia,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject brightness/contrast outside [0, 200]
    ///
    /// Out-of-range values are a caller error; they are never clamped.
    pub fn validate(&self) -> Result<()> {
        check_percent("brightness", self.brightness)?;
        check_percent("contrast", self.contrast)?;
        Ok(())
    }

    /// Convert to JSON string for database storage
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string (from database)
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// True when rendering with these parameters leaves the image untouched
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all filters to the identity transform
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Equivalent CSS filter chain, in application order
    pub fn css_filter(&self) -> String {
        let mut chain = format!(
            "brightness({}%) contrast({}%)",
            self.brightness, self.contrast
        );
        if self.grayscale {
            chain.push_str(" grayscale(100%)");
        }
        if self.sepia {
            chain.push_str(" sepia(100%)");
        }
        chain
    }
}

fn check_percent(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || !(PERCENT_MIN..=PERCENT_MAX).contains(&value) {
        return Err(PhotoboothError::validation(
            "INVALID_FILTER",
            format!(
                "{} must be between {} and {}, got {}",
                field, PERCENT_MIN, PERCENT_MAX, value
            ),
        ));
    }
    Ok(())
}
