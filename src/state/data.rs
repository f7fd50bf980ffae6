/// Shared data structures for the photo store
///
/// These structs represent the data model that flows between
/// the store, the share service and whatever transport sits in front.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edit::FilterParameters;
use super::overlay::OverlayList;

/// A persisted photo
///
/// Field names on the wire are `userId` and `imageUrl` for existing clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// Store-assigned id
    pub id: i64,
    /// Opaque owner id from the session provider
    #[serde(rename = "userId")]
    pub owner_id: String,
    /// Reference to the final composited image (URL or data URL)
    #[serde(rename = "imageUrl")]
    pub image_ref: String,
    /// Public read token, unique across the store
    pub share_token: String,
    /// Filters used to produce `image_ref`; never re-applied on read
    pub filters: FilterParameters,
    /// Overlays used to produce `image_ref`; never re-applied on read
    pub overlays: OverlayList,
    pub created_at: DateTime<Utc>,
}

/// Everything the store needs to insert a record (all but the id)
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhotoRecord {
    pub owner_id: String,
    pub image_ref: String,
    pub share_token: String,
    pub filters: FilterParameters,
    pub overlays: OverlayList,
    pub created_at: DateTime<Utc>,
}

impl NewPhotoRecord {
    pub fn with_id(self, id: i64) -> PhotoRecord {
        PhotoRecord {
            id,
            owner_id: self.owner_id,
            image_ref: self.image_ref,
            share_token: self.share_token,
            filters: self.filters,
            overlays: self.overlays,
            created_at: self.created_at,
        }
    }
}

/// What an anonymous token holder gets to see
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPhoto {
    pub id: i64,
    #[serde(rename = "imageUrl")]
    pub image_ref: String,
    pub share_token: String,
    pub filters: FilterParameters,
    pub overlays: OverlayList,
    pub created_at: DateTime<Utc>,
}

impl From<PhotoRecord> for PublicPhoto {
    fn from(record: PhotoRecord) -> Self {
        Self {
            id: record.id,
            image_ref: record.image_ref,
            share_token: record.share_token,
            filters: record.filters,
            overlays: record.overlays,
            created_at: record.created_at,
        }
    }
}

/// Creation request as received from a caller
///
/// `share_token` is optional; a fresh one is generated when absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhoto {
    #[serde(rename = "userId", default)]
    pub owner_id: String,
    #[serde(rename = "imageUrl", default)]
    pub image_ref: String,
    #[serde(default)]
    pub share_token: Option<String>,
    #[serde(default)]
    pub filters: FilterParameters,
    #[serde(default)]
    pub overlays: OverlayList,
}

impl CreatePhoto {
    pub fn new(owner_id: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            image_ref: image_ref.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.share_token = Some(token.into());
        self
    }
}
