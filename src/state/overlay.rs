/// Positioned decorations drawn on top of the filtered photo
///
/// Overlays are immutable values. The list they live in only grows
/// (insertion order is paint order) or is discarded as a whole.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{PhotoboothError, Result};

/// Position in base-image pixel space (not display space)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What an overlay draws
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    /// A sticker glyph (emoji reference)
    Sticker { emoji: String },
    /// Literal caption text
    Text { content: String },
}

impl OverlayKind {
    /// Prefix used for generated overlay ids
    pub fn label(&self) -> &'static str {
        match self {
            OverlayKind::Sticker { .. } => "sticker",
            OverlayKind::Text { .. } => "text",
        }
    }
}

/// A single placed overlay
///
/// Serializes flat, e.g. `{"id":"sticker-1","x":10.0,"y":10.0,"type":"sticker","emoji":"⭐"}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: String,
    #[serde(flatten)]
    pub position: Point,
    #[serde(flatten)]
    pub kind: OverlayKind,
}

impl Overlay {
    pub fn sticker(id: impl Into<String>, position: Point, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            kind: OverlayKind::Sticker {
                emoji: emoji.into(),
            },
        }
    }

    pub fn text(id: impl Into<String>, position: Point, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            kind: OverlayKind::Text {
                content: content.into(),
            },
        }
    }

    /// Check the overlay can be rendered
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PhotoboothError::validation(
                "INVALID_OVERLAY",
                "overlay id must not be empty",
            ));
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(PhotoboothError::validation(
                "INVALID_OVERLAY",
                format!("overlay {} has a non-finite position", self.id),
            ));
        }
        let empty = match &self.kind {
            OverlayKind::Sticker { emoji } => emoji.is_empty(),
            OverlayKind::Text { content } => content.is_empty(),
        };
        if empty {
            return Err(PhotoboothError::validation(
                "INVALID_OVERLAY",
                format!("overlay {} has nothing to draw", self.id),
            ));
        }
        Ok(())
    }
}

/// Ordered overlay list; later entries paint on top
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "Vec<Overlay>", into = "Vec<Overlay>")]
pub struct OverlayList {
    items: Vec<Overlay>,
}

impl OverlayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an overlay on top of the existing ones
    ///
    /// Ids must stay unique within the list.
    pub fn push(&mut self, overlay: Overlay) -> Result<()> {
        overlay.validate()?;
        if self.items.iter().any(|o| o.id == overlay.id) {
            return Err(PhotoboothError::validation(
                "DUPLICATE_OVERLAY_ID",
                format!("overlay id {} is already used", overlay.id),
            ));
        }
        self.items.push(overlay);
        Ok(())
    }

    /// Discard every overlay
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Overlay> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Overlay] {
        &self.items
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TryFrom<Vec<Overlay>> for OverlayList {
    type Error = PhotoboothError;

    fn try_from(overlays: Vec<Overlay>) -> Result<Self> {
        let mut list = OverlayList::new();
        for overlay in overlays {
            list.push(overlay)?;
        }
        Ok(list)
    }
}

impl From<OverlayList> for Vec<Overlay> {
    fn from(list: OverlayList) -> Self {
        list.items
    }
}

impl<'a> IntoIterator for &'a OverlayList {
    type Item = &'a Overlay;
    type IntoIter = std::slice::Iter<'a, Overlay>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Hands out overlay ids that are unique for one editing session
///
/// Ids combine the session start time with a counter, e.g.
/// `sticker-1734258600000-3`, so two sessions started in different
/// milliseconds never collide and one session never repeats itself.
#[derive(Debug, Clone)]
pub struct OverlayIdGenerator {
    session_millis: i64,
    next: u64,
}

impl Default for OverlayIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(Utc::now().timestamp_millis())
    }

    /// Generator with a fixed session start (reproducible ids)
    pub fn starting_at(session_millis: i64) -> Self {
        Self {
            session_millis,
            next: 0,
        }
    }

    pub fn next_id(&mut self, kind: &OverlayKind) -> String {
        let id = format!("{}-{}-{}", kind.label(), self.session_millis, self.next);
        self.next += 1;
        id
    }
}
