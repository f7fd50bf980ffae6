/// Photo records and token-based sharing
///
/// This module handles:
/// - Creating photo records with a unique share token (this file)
/// - Lookup by id, resolution by token, owner-checked deletion, listing
/// - Token generation (token.rs)
/// - Share URLs and QR codes (qr.rs)
///
/// Input validation always runs before the store is touched, so a
/// rejected request never leaves anything behind.

pub mod qr;
pub mod token;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{PhotoboothError, Result};
use crate::state::data::{CreatePhoto, NewPhotoRecord, PhotoRecord, PublicPhoto};
use crate::state::library::PhotoStore;

pub use qr::{share_url, ShareLink, DEFAULT_QR_SIZE};
pub use token::generate_token;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Hard upper bound on a listing page
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfig {
    pub base_url: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub qr_size: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            qr_size: DEFAULT_QR_SIZE,
        }
    }
}

/// Front door to the photo store
pub struct PhotoService<S: PhotoStore> {
    store: S,
    config: ShareConfig,
}

impl<S: PhotoStore> PhotoService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ShareConfig::default())
    }

    pub fn with_config(store: S, config: ShareConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    // ========== Create ==========

    /// Persist a finished photo and assign its share token
    ///
    /// Owner id and image reference are trimmed before storage. A blank
    /// or missing token is replaced by a generated one; a supplied token
    /// that already exists fails with `Conflict`, never a silent rename.
    pub fn create(&self, request: CreatePhoto) -> Result<PhotoRecord> {
        let owner_id = required_field(
            &request.owner_id,
            "MISSING_USER_ID",
            "INVALID_USER_ID",
            "userId",
        )?;
        let image_ref = required_field(
            &request.image_ref,
            "MISSING_IMAGE_URL",
            "INVALID_IMAGE_URL",
            "imageUrl",
        )?;
        request.filters.validate()?;

        let share_token = match token::normalize_requested(request.share_token.as_deref()) {
            Some(requested) => {
                // Early rejection only; the store's unique constraint decides races
                if self.store.get_by_token(&requested)?.is_some() {
                    warn!(token = %requested, "share token already in use");
                    return Err(PhotoboothError::Conflict(requested));
                }
                requested
            }
            None => generate_token(),
        };

        let record = self.store.insert(NewPhotoRecord {
            owner_id,
            image_ref,
            share_token,
            filters: request.filters,
            overlays: request.overlays,
            created_at: Utc::now(),
        })?;

        info!(id = record.id, owner = %record.owner_id, "photo created");
        Ok(record)
    }

    // ========== Read ==========

    /// Owner-facing lookup by id (as received from the transport)
    pub fn get(&self, id: &str) -> Result<PhotoRecord> {
        let id = parse_id(id)?;
        self.store
            .get_by_id(id)?
            .ok_or_else(|| PhotoboothError::NotFound(format!("photo {}", id)))
    }

    /// Public lookup: token possession is the only authorization
    pub fn resolve(&self, token: &str) -> Result<PublicPhoto> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PhotoboothError::validation(
                "INVALID_TOKEN",
                "Valid share token is required",
            ));
        }

        match self.store.get_by_token(token)? {
            Some(record) => {
                debug!(id = record.id, "share token resolved");
                Ok(record.into())
            }
            None => Err(PhotoboothError::NotFound(format!("share token {}", token))),
        }
    }

    /// Share URL and QR code for an existing token
    pub fn share_link(&self, token: &str) -> Result<ShareLink> {
        let photo = self.resolve(token)?;
        ShareLink::new(&self.config.base_url, &photo.share_token, self.config.qr_size)
    }

    /// Newest first, optionally for one owner
    ///
    /// A missing or zero limit uses the default page size; anything above
    /// the maximum is capped.
    pub fn list(
        &self,
        owner_id: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<PhotoRecord>> {
        let limit = self.page_size(limit);
        let owner_id = owner_id.map(str::trim).filter(|o| !o.is_empty());
        self.store
            .list_by_owner(owner_id, limit, offset.unwrap_or(0))
    }

    fn page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.config.max_page_size),
            _ => self.config.default_page_size.min(self.config.max_page_size),
        }
    }

    // ========== Delete ==========

    /// Delete a photo on behalf of its owner
    ///
    /// Once this returns, the share token no longer resolves.
    pub fn delete(&self, id: &str, owner_id: &str) -> Result<PhotoRecord> {
        let id = parse_id(id)?;
        let owner_id = owner_id.trim();

        let existing = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| PhotoboothError::NotFound(format!("photo {}", id)))?;
        if existing.owner_id != owner_id {
            warn!(id, "delete refused for non-owner");
            return Err(PhotoboothError::Forbidden(format!(
                "photo {} belongs to another user",
                id
            )));
        }

        let deleted = self
            .store
            .delete_by_id(id)?
            .ok_or_else(|| PhotoboothError::NotFound(format!("photo {}", id)))?;
        info!(id, "photo deleted");
        Ok(deleted)
    }
}

/// Parse a record id: positive decimal integer, nothing else
pub fn parse_id(raw: &str) -> Result<i64> {
    let invalid = || PhotoboothError::validation("INVALID_ID", "Valid ID is required");
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid()),
    }
}

fn required_field(
    value: &str,
    missing_code: &'static str,
    invalid_code: &'static str,
    name: &str,
) -> Result<String> {
    if value.is_empty() {
        return Err(PhotoboothError::validation(
            missing_code,
            format!("{} is required", name),
        ));
    }
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PhotoboothError::validation(
            invalid_code,
            format!("{} must be a non-empty string", name),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::Library;

    fn service() -> PhotoService<Library> {
        PhotoService::new(Library::open_in_memory().unwrap())
    }

    #[test]
    fn test_parse_id_is_strict() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for bad in ["", "abc", "12abc", "-3", "0", " 7", "+7", "1.5", "99999999999999999999"] {
            let err = parse_id(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_ID", "input {:?}", bad);
        }
    }

    #[test]
    fn test_create_trims_and_generates_token() {
        let service = service();
        let record = service
            .create(CreatePhoto::new("  u1 ", " http://x/img.png\n").with_token("   "))
            .unwrap();
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.image_ref, "http://x/img.png");
        assert_eq!(record.share_token.len(), token::GENERATED_TOKEN_LEN);
    }

    #[test]
    fn test_missing_and_blank_fields_have_distinct_codes() {
        let service = service();
        let err = service.create(CreatePhoto::new("", "http://x")).unwrap_err();
        assert_eq!(err.code(), "MISSING_USER_ID");
        let err = service.create(CreatePhoto::new("  ", "http://x")).unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_ID");
        let err = service.create(CreatePhoto::new("u1", "")).unwrap_err();
        assert_eq!(err.code(), "MISSING_IMAGE_URL");
        let err = service.create(CreatePhoto::new("u1", "\t")).unwrap_err();
        assert_eq!(err.code(), "INVALID_IMAGE_URL");
        assert_eq!(service.store().photo_count().unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_filters_are_rejected_before_insert() {
        let service = service();
        let mut request = CreatePhoto::new("u1", "http://x");
        request.filters.contrast = 201.0;
        let err = service.create(request).unwrap_err();
        assert_eq!(err.code(), "INVALID_FILTER");
        assert_eq!(service.store().photo_count().unwrap(), 0);
    }

    #[test]
    fn test_resolve_rejects_blank_token() {
        let err = service().resolve("  ").unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_delete_requires_owner() {
        let service = service();
        let record = service.create(CreatePhoto::new("u1", "http://x")).unwrap();
        let id = record.id.to_string();

        let err = service.delete(&id, "u2").unwrap_err();
        assert!(matches!(err, PhotoboothError::Forbidden(_)));
        assert!(service.get(&id).is_ok());

        service.delete(&id, "u1").unwrap();
        assert!(service.get(&id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_page_size_defaults_and_caps() {
        let service = service();
        assert_eq!(service.page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(service.page_size(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(service.page_size(Some(25)), 25);
        assert_eq!(service.page_size(Some(5000)), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_share_link_requires_existing_token() {
        let service = service();
        let record = service
            .create(CreatePhoto::new("u1", "http://x").with_token("tok-9"))
            .unwrap();
        let link = service.share_link(&record.share_token).unwrap();
        assert_eq!(link.url, "http://localhost:3000/share/tok-9");
        assert!(!link.qr_png.is_empty());

        assert!(service.share_link("nope").unwrap_err().is_not_found());
    }
}
