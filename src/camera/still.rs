/// File-backed camera
///
/// Serves a still image from disk as if it were a live camera. Used by the
/// CLI and for running the capture flow on machines without a webcam.

use std::path::{Path, PathBuf};

use tokio::task;
use tracing::debug;

use super::CameraDevice;
use crate::error::{PhotoboothError, Result};
use crate::render::encoding::decode_image;

pub struct StillCamera {
    path: PathBuf,
    frame: Option<Vec<u8>>,
}

impl StillCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.frame.is_some()
    }
}

impl CameraDevice for StillCamera {
    async fn open(&mut self) -> Result<()> {
        let path = self.path.clone();
        let frame = task::spawn_blocking(move || -> Result<Vec<u8>> {
            let bytes = std::fs::read(&path).map_err(|e| {
                PhotoboothError::DeviceAccess(format!("{}: {}", path.display(), e))
            })?;
            // Refuse to "open" something that will never produce a frame
            decode_image(&bytes).map_err(|e| {
                PhotoboothError::DeviceAccess(format!("{}: {}", path.display(), e))
            })?;
            Ok(bytes)
        })
        .await
        .map_err(|e| PhotoboothError::DeviceAccess(format!("camera task failed: {}", e)))??;

        debug!(path = %self.path.display(), bytes = frame.len(), "still camera opened");
        self.frame = Some(frame);
        Ok(())
    }

    async fn grab_frame(&mut self) -> Result<Vec<u8>> {
        self.frame
            .clone()
            .ok_or_else(|| PhotoboothError::DeviceAccess("camera is not open".to_string()))
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
