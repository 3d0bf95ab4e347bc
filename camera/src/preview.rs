use std::cell::RefCell;

use serde_json::Value;

use crate::client::{ProxyClient, SubmitError};
use crate::device::{CameraError, MediaConstraints, MediaDevices, MediaStream, StreamGuard};
use crate::image::{CapturedImage, ImageFormat};
use crate::notify::Notifier;

pub const CAMERA_START_FAILED: &str =
    "Could not start the camera. Check camera permissions and browser support.";

pub const DEFAULT_ENDPOINT: &str = "/api/vision";

/// How the proxy's JSON answer is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseDisplay {
    /// Two-space indented.
    #[default]
    Pretty,
    /// Compact, as received.
    Raw,
}

impl ResponseDisplay {
    pub fn render(&self, value: &Value) -> String {
        let rendered = match self {
            ResponseDisplay::Pretty => serde_json::to_string_pretty(value),
            ResponseDisplay::Raw => serde_json::to_string(value),
        };

        // Serialising a Value cannot fail
        rendered.unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub endpoint: String,
    pub constraints: MediaConstraints,
    pub image_format: ImageFormat,
    pub display: ResponseDisplay,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            constraints: MediaConstraints::default(),
            image_format: ImageFormat::Png,
            display: ResponseDisplay::Pretty,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CameraActive,
    FrameCaptured,
    Submitted,
}

struct Session<S: MediaStream> {
    stream: Option<StreamGuard<S>>,
    captured: Option<CapturedImage>,
    server_response: Option<String>,
    phase: Phase,
    // Bumped on every stop; a start that resolves after a stop is discarded
    releases: u64,
}

/// The capture flow: preview a camera, snap a frame, send it, show the answer.
///
/// Holds at most one stream and one captured image. The stream lives in a
/// [`StreamGuard`], so dropping the preview releases the camera.
///
/// Every operation takes `&self` and no borrow of the state outlives an
/// `.await`, so stop and capture keep working while a start or a send is
/// still pending. Whichever action finishes last decides the shown state.
pub struct CameraPreview<D: MediaDevices, C: ProxyClient, N: Notifier> {
    devices: D,
    client: C,
    notifier: N,
    config: CaptureConfig,

    session: RefCell<Session<D::Stream>>,
}

impl<D: MediaDevices, C: ProxyClient, N: Notifier> CameraPreview<D, C, N> {
    pub fn new(devices: D, client: C, notifier: N, config: CaptureConfig) -> Self {
        CameraPreview {
            devices,
            client,
            notifier,
            config,
            session: RefCell::new(Session {
                stream: None,
                captured: None,
                server_response: None,
                phase: Phase::Idle,
                releases: 0,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.borrow().phase
    }

    pub fn is_streaming(&self) -> bool {
        self.session.borrow().stream.is_some()
    }

    pub fn captured_image(&self) -> Option<CapturedImage> {
        self.session.borrow().captured.clone()
    }

    pub fn server_response(&self) -> Option<String> {
        self.session.borrow().server_response.clone()
    }

    /// Ask for the camera. On failure the user is alerted and nothing changes.
    /// A stream granted after the camera was stopped again is released
    /// straight away.
    pub async fn start_camera(&self) -> Result<(), CameraError> {
        let releases = {
            let session = self.session.borrow();
            if session.stream.is_some() {
                return Ok(());
            }
            session.releases
        };

        let stream = match self.devices.get_user_media(&self.config.constraints).await {
            Ok(stream) => StreamGuard::new(stream),
            Err(e) => {
                tracing::error!("failed to start camera: {}", e);
                self.notifier.alert(CAMERA_START_FAILED);
                return Err(e);
            }
        };

        let mut session = self.session.borrow_mut();
        if session.releases != releases {
            tracing::info!("camera stopped while starting, releasing stream");
            return Ok(());
        }
        if session.stream.is_some() {
            // Another start won the race
            return Ok(());
        }

        tracing::info!("camera started");
        session.stream = Some(stream);
        session.phase = Phase::CameraActive;
        Ok(())
    }

    /// Release the camera. Does nothing when no stream is active, apart from
    /// cancelling a start that is still waiting for the platform.
    pub fn stop_camera(&self) {
        let stream = {
            let mut session = self.session.borrow_mut();
            session.releases += 1;
            let stream = session.stream.take();
            if stream.is_some() {
                session.phase = Phase::Idle;
            }
            stream
        };

        drop(stream);
    }

    /// Snap the current frame. Returns false, keeping any earlier capture,
    /// when there is no stream or the frame cannot be drawn.
    pub fn capture_image(&self) -> bool {
        let mut session = self.session.borrow_mut();
        let Some(stream) = session.stream.as_mut() else {
            return false;
        };

        match stream.capture(self.config.image_format) {
            Ok(image) => {
                tracing::debug!(?image, "captured frame");
                session.captured = Some(image);
                session.phase = Phase::FrameCaptured;
                true
            }
            Err(e) => {
                tracing::debug!("capture skipped: {}", e);
                false
            }
        }
    }

    /// Send the captured frame to the proxy and keep the rendered answer.
    pub async fn send_image_to_server(&self) -> Result<(), SubmitError> {
        let payload = self
            .session
            .borrow()
            .captured
            .as_ref()
            .map(|image| image.base64_payload().to_string());

        let Some(payload) = payload else {
            let err = SubmitError::NothingCaptured;
            self.notifier.alert(&err.to_string());
            return Err(err);
        };

        match self.client.submit(&payload).await {
            Ok(result) => {
                tracing::info!("server responded");
                let rendered = self.config.display.render(&result);
                let mut session = self.session.borrow_mut();
                session.server_response = Some(rendered);
                session.phase = Phase::Submitted;
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to send image: {}", e);
                self.notifier
                    .alert(&format!("Failed to send.\nError detail: {}", e));
                Err(e)
            }
        }
    }
}
