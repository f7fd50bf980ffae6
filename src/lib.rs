//! Photo booth core
//!
//! Capture a frame, apply filters and stickers, save the result and share
//! it through an unguessable token with a QR code.
//!
//! - [`camera`]: capture session state machine over a [`camera::CameraDevice`]
//! - [`state`]: filter and overlay models, the editing session, the photo store
//! - [`render`]: deterministic compositing of base image + filters + overlays
//! - [`share`]: photo records, share tokens, public resolution, QR links
//! - [`config`]: TOML configuration

pub mod camera;
pub mod config;
pub mod error;
pub mod render;
pub mod share;
pub mod state;

pub use config::Config;
pub use error::{PhotoboothError, Result};
pub use render::Compositor;
pub use share::{PhotoService, ShareConfig, ShareLink};
pub use state::data::{CreatePhoto, PhotoRecord, PublicPhoto};
pub use state::edit::FilterParameters;
pub use state::library::{Library, PhotoStore};
pub use state::overlay::{Overlay, OverlayKind, OverlayList, Point};
pub use state::session::EditSession;
