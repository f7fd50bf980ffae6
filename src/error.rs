/// Central error type for the photo booth
///
/// Every failure the core can produce is one of these kinds. Callers
/// match on the variant (or use `code()` / `status_code()`) instead of
/// parsing messages, so a store fault is never confused with a missing
/// record or a rejected input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoboothError {
    /// Malformed or missing input; raised before any side effect
    #[error("{message}")]
    Validation {
        code: &'static str,
        message: String,
    },

    /// Referenced record or share token does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Share token already taken (pre-check or store constraint)
    #[error("share token already exists: {0}")]
    Conflict(String),

    /// Base image could not be interpreted as a raster
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Final canvas could not be encoded
    #[error("image encode error: {0}")]
    ImageEncode(String),

    /// Camera denied or unavailable; the user may retry
    #[error("camera unavailable: {0}")]
    DeviceAccess(String),

    /// Caller is not the owner of the record
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Underlying SQLite failure
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Stored filter/overlay snapshot does not match the expected shape
    #[error("record {id} is corrupt: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("qr code error: {0}")]
    QrCode(String),
}

pub type Result<T> = std::result::Result<T, PhotoboothError>;

impl PhotoboothError {
    /// Shorthand for a validation failure
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        PhotoboothError::Validation {
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable code, as returned on the transport boundary
    pub fn code(&self) -> &'static str {
        match self {
            PhotoboothError::Validation { code, .. } => *code,
            PhotoboothError::NotFound(_) => "PHOTO_NOT_FOUND",
            PhotoboothError::Conflict(_) => "DUPLICATE_SHARE_TOKEN",
            PhotoboothError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            PhotoboothError::ImageEncode(_) => "IMAGE_ENCODE_ERROR",
            PhotoboothError::DeviceAccess(_) => "DEVICE_UNAVAILABLE",
            PhotoboothError::Forbidden(_) => "FORBIDDEN",
            PhotoboothError::Store(_)
            | PhotoboothError::CorruptRecord { .. }
            | PhotoboothError::Io(_)
            | PhotoboothError::Config(_)
            | PhotoboothError::QrCode(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-equivalent status for the error kind
    pub fn status_code(&self) -> u16 {
        match self {
            PhotoboothError::Validation { .. } | PhotoboothError::ImageDecode(_) => 400,
            PhotoboothError::Forbidden(_) => 403,
            PhotoboothError::NotFound(_) => 404,
            PhotoboothError::Conflict(_) => 409,
            PhotoboothError::DeviceAccess(_) => 503,
            _ => 500,
        }
    }

    /// Only device acquisition failures are worth retrying as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, PhotoboothError::DeviceAccess(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PhotoboothError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PhotoboothError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinguish_kinds() {
        let invalid = PhotoboothError::validation("INVALID_ID", "Valid ID is required");
        assert_eq!(invalid.code(), "INVALID_ID");
        assert_eq!(invalid.status_code(), 400);
        assert_eq!(invalid.to_string(), "Valid ID is required");

        let missing = PhotoboothError::NotFound("photo 7".into());
        assert_eq!(missing.code(), "PHOTO_NOT_FOUND");
        assert_eq!(missing.status_code(), 404);

        let dup = PhotoboothError::Conflict("tok-1".into());
        assert_eq!(dup.code(), "DUPLICATE_SHARE_TOKEN");
        assert_eq!(dup.status_code(), 409);
    }

    #[test]
    fn test_only_device_errors_are_retryable() {
        assert!(PhotoboothError::DeviceAccess("denied".into()).is_retryable());
        assert!(!PhotoboothError::NotFound("x".into()).is_retryable());
        assert!(!PhotoboothError::Conflict("x".into()).is_retryable());
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err: PhotoboothError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.status_code(), 500);
    }
}
