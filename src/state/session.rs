/// Editing session between capture and save
///
/// Holds the captured base image and everything the user changes on top
/// of it. Nothing here is persisted until `finish` hands a creation
/// request to the share service; cancelling is just dropping the session.

use image::DynamicImage;

use super::data::CreatePhoto;
use super::edit::FilterParameters;
use super::overlay::{Overlay, OverlayIdGenerator, OverlayKind, OverlayList, Point};
use crate::error::Result;
use crate::render::encoding::{decode_image, encode_png, to_data_url, PNG_MIME};
use crate::render::placement::{display_to_image, DisplayRect};
use crate::render::Compositor;

pub struct EditSession {
    base: DynamicImage,
    filters: FilterParameters,
    overlays: OverlayList,
    ids: OverlayIdGenerator,
    selected_sticker: Option<String>,
    compositor: Compositor,
}

impl EditSession {
    /// Start editing an encoded base image
    pub fn new(base: &[u8], compositor: Compositor) -> Result<Self> {
        Ok(Self::from_image(decode_image(base)?, compositor))
    }

    pub fn from_image(base: DynamicImage, compositor: Compositor) -> Self {
        Self {
            base,
            filters: FilterParameters::default(),
            overlays: OverlayList::new(),
            ids: OverlayIdGenerator::new(),
            selected_sticker: None,
            compositor,
        }
    }

    /// Use a fixed id generator (reproducible overlay ids)
    pub fn with_id_generator(mut self, ids: OverlayIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Base image size; overlay positions live in this space
    pub fn dimensions(&self) -> (u32, u32) {
        (self.base.width(), self.base.height())
    }

    // ========== Filters ==========

    pub fn filters(&self) -> &FilterParameters {
        &self.filters
    }

    /// Set brightness; out-of-range values leave the filters unchanged
    pub fn set_brightness(&mut self, percent: f32) -> Result<()> {
        let next = FilterParameters {
            brightness: percent,
            ..self.filters
        };
        next.validate()?;
        self.filters = next;
        Ok(())
    }

    /// Set contrast; out-of-range values leave the filters unchanged
    pub fn set_contrast(&mut self, percent: f32) -> Result<()> {
        let next = FilterParameters {
            contrast: percent,
            ..self.filters
        };
        next.validate()?;
        self.filters = next;
        Ok(())
    }

    pub fn toggle_grayscale(&mut self) {
        self.filters.grayscale = !self.filters.grayscale;
    }

    pub fn toggle_sepia(&mut self) {
        self.filters.sepia = !self.filters.sepia;
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    // ========== Overlays ==========

    pub fn overlays(&self) -> &OverlayList {
        &self.overlays
    }

    pub fn select_sticker(&mut self, glyph: Option<&str>) {
        self.selected_sticker = glyph.map(str::to_string);
    }

    /// Select a sticker for the next click; selecting it again deselects
    pub fn toggle_sticker(&mut self, glyph: &str) {
        if self.selected_sticker.as_deref() == Some(glyph) {
            self.selected_sticker = None;
        } else {
            self.selected_sticker = Some(glyph.to_string());
        }
    }

    pub fn selected_sticker(&self) -> Option<&str> {
        self.selected_sticker.as_deref()
    }

    /// Place the selected sticker where the user clicked
    ///
    /// Returns `None` when no sticker is selected. The selection is
    /// cleared after a successful placement.
    pub fn place_selected(
        &mut self,
        client_x: f32,
        client_y: f32,
        rect: DisplayRect,
    ) -> Result<Option<Overlay>> {
        let Some(glyph) = self.selected_sticker.clone() else {
            return Ok(None);
        };
        let (width, height) = self.dimensions();
        let position = display_to_image(client_x, client_y, rect, width, height)?;
        let overlay = self.add_sticker(&glyph, position)?;
        self.selected_sticker = None;
        Ok(Some(overlay))
    }

    /// Add a sticker at an image-space position
    pub fn add_sticker(&mut self, glyph: &str, position: Point) -> Result<Overlay> {
        self.push(
            OverlayKind::Sticker {
                emoji: glyph.to_string(),
            },
            position,
        )
    }

    /// Add a caption at an image-space position
    pub fn add_text(&mut self, content: &str, position: Point) -> Result<Overlay> {
        self.push(
            OverlayKind::Text {
                content: content.to_string(),
            },
            position,
        )
    }

    /// Throw away every overlay
    pub fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    fn push(&mut self, kind: OverlayKind, position: Point) -> Result<Overlay> {
        let overlay = Overlay {
            id: self.ids.next_id(&kind),
            position,
            kind,
        };
        self.overlays.push(overlay.clone())?;
        Ok(overlay)
    }

    // ========== Output ==========

    /// Current result as PNG bytes
    pub fn render(&self) -> Result<Vec<u8>> {
        let canvas = self
            .compositor
            .render(&self.base, &self.filters, &self.overlays)?;
        encode_png(&canvas)
    }

    /// Compose the final image and build the save request
    ///
    /// The image is embedded as a PNG data URL; filters and overlays are
    /// attached as the snapshot that produced it.
    pub fn finish(self, owner_id: &str) -> Result<CreatePhoto> {
        let png = self.render()?;
        Ok(CreatePhoto {
            owner_id: owner_id.to_string(),
            image_ref: to_data_url(&png, PNG_MIME),
            share_token: None,
            filters: self.filters,
            overlays: self.overlays,
        })
    }
}
