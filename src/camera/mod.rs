/// Camera capture session
///
/// A capture session owns the camera device from acquisition until the
/// frame is grabbed. States:
///
/// ```text
/// Idle -> Acquiring -> Active -> CountingDown(n) .. CountingDown(1) -> Captured -> Idle
///            |            ^              |
///            v            +-- cancel ----+
///          Idle
/// ```
///
/// The device is released on every path back to `Idle` (stop, failed
/// grab, successful capture, drop). A cancelled countdown returns to
/// `Active` with the device still open so the user can try again.

pub mod still;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{PhotoboothError, Result};

pub use still::StillCamera;

pub const DEFAULT_COUNTDOWN_TICKS: u32 = 3;
pub const DEFAULT_COUNTDOWN_INTERVAL: Duration = Duration::from_millis(1000);

/// A frame source that must be explicitly released
pub trait CameraDevice: Send {
    /// Acquire the device; failures are reported as `DeviceAccess`
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Encoded still image of the current frame
    fn grab_frame(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Release the device; must be safe to call on an idle device
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Acquiring,
    Active,
    /// Ticks left before the frame is grabbed
    CountingDown(u32),
    Captured,
}

/// How a countdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Captured,
    Cancelled,
}

/// Aborts a running countdown from anywhere
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

pub struct CaptureSession<D: CameraDevice> {
    device: D,
    device_open: bool,
    state: CaptureState,
    capture: Option<Vec<u8>>,
    ticks: u32,
    interval: Duration,
    cancel: Arc<watch::Sender<bool>>,
}

impl<D: CameraDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            device,
            device_open: false,
            state: CaptureState::Idle,
            capture: None,
            ticks: DEFAULT_COUNTDOWN_TICKS,
            interval: DEFAULT_COUNTDOWN_INTERVAL,
            cancel: Arc::new(tx),
        }
    }

    /// Override the countdown length and tick interval
    pub fn with_countdown(mut self, ticks: u32, interval: Duration) -> Self {
        self.ticks = ticks;
        self.interval = interval;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_device_open(&self) -> bool {
        self.device_open
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    /// Acquire the camera (Idle -> Acquiring -> Active)
    ///
    /// Calling this on an active session is a no-op. On failure the
    /// session is back in `Idle` and the caller may simply retry.
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            CaptureState::Idle => {}
            CaptureState::Active => return Ok(()),
            other => return Err(invalid_state("start", other)),
        }

        self.state = CaptureState::Acquiring;
        match self.device.open().await {
            Ok(()) => {
                self.device_open = true;
                self.state = CaptureState::Active;
                info!("camera acquired");
                Ok(())
            }
            Err(e) => {
                // A half-opened device must not keep its lock
                self.device.stop();
                self.state = CaptureState::Idle;
                warn!(error = %e, "camera acquisition failed");
                Err(as_device_error(e))
            }
        }
    }

    /// Count down, then grab a frame
    ///
    /// `on_tick` is called with the remaining tick count (n, n-1, .., 1)
    /// as each tick starts. Cancelling before the last tick elapses
    /// returns `Cancelled` and leaves the device active. After a grab the
    /// device is released whether it succeeded or not.
    pub async fn countdown<F>(&mut self, mut on_tick: F) -> Result<CountdownOutcome>
    where
        F: FnMut(u32),
    {
        if self.state != CaptureState::Active {
            return Err(invalid_state("count down", self.state));
        }

        // Only cancels issued from here on count
        self.cancel.send_replace(false);
        let mut cancelled = self.cancel.subscribe();

        for remaining in (1..=self.ticks).rev() {
            self.state = CaptureState::CountingDown(remaining);
            debug!(remaining, "countdown tick");
            on_tick(remaining);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel_requested(&mut cancelled) => {
                    self.state = CaptureState::Active;
                    info!(remaining, "countdown cancelled");
                    return Ok(CountdownOutcome::Cancelled);
                }
            }
        }

        let grabbed = self.device.grab_frame().await;
        self.release();
        match grabbed {
            Ok(frame) => {
                info!(bytes = frame.len(), "frame captured");
                self.capture = Some(frame);
                self.state = CaptureState::Captured;
                Ok(CountdownOutcome::Captured)
            }
            Err(e) => {
                self.state = CaptureState::Idle;
                warn!(error = %e, "frame grab failed");
                Err(as_device_error(e))
            }
        }
    }

    /// Hand out the captured frame (Captured -> Idle)
    pub fn take_capture(&mut self) -> Option<Vec<u8>> {
        if self.state != CaptureState::Captured {
            return None;
        }
        self.state = CaptureState::Idle;
        self.capture.take()
    }

    /// Abandon the session from any state; releases the device
    pub fn stop(&mut self) {
        self.release();
        self.capture = None;
        self.state = CaptureState::Idle;
    }

    fn release(&mut self) {
        if self.device_open {
            self.device.stop();
            self.device_open = false;
            debug!("camera released");
        }
    }
}

impl<D: CameraDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

async fn cancel_requested(rx: &mut watch::Receiver<bool>) {
    // The sender lives in the session, so this only returns on cancel
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}

fn invalid_state(action: &str, state: CaptureState) -> PhotoboothError {
    PhotoboothError::validation(
        "INVALID_CAPTURE_STATE",
        format!("cannot {} while {:?}", action, state),
    )
}

fn as_device_error(e: PhotoboothError) -> PhotoboothError {
    match e {
        PhotoboothError::DeviceAccess(_) => e,
        other => PhotoboothError::DeviceAccess(other.to_string()),
    }
}
