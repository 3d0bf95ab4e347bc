use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use thiserror::Error;

use crate::image::{CapturedImage, ImageFormat};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera available: {0}")]
    Unavailable(String),
    #[error("camera stream not ready")]
    NotReady,
    #[error("drawing surface failed: {0}")]
    Surface(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// What to ask the platform for. Defaults to the rear camera, video only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        MediaConstraints {
            facing_mode: FacingMode::Environment,
            audio: false,
        }
    }
}

/// The platform's camera access, `navigator.mediaDevices` in a browser.
#[async_trait(?Send)]
pub trait MediaDevices {
    type Stream: MediaStream;

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Self::Stream, CameraError>;
}

/// A live video stream attached to a preview.
pub trait MediaStream {
    /// Native resolution of the current frame; `None` until the video has
    /// produced one.
    fn video_size(&self) -> Option<(u32, u32)>;

    /// Draw the current frame into a surface sized to `width` x `height` and
    /// export it.
    fn snapshot(
        &mut self,
        width: u32,
        height: u32,
        format: ImageFormat,
    ) -> Result<CapturedImage, CameraError>;

    /// Stop every track of the stream. Must be safe to call twice.
    fn stop_tracks(&mut self);
}

/// Owns an acquired stream and stops its tracks when dropped, so the camera
/// is released on teardown as well as on an explicit stop.
pub struct StreamGuard<S: MediaStream> {
    stream: S,
}

impl<S: MediaStream> StreamGuard<S> {
    pub fn new(stream: S) -> StreamGuard<S> {
        StreamGuard { stream }
    }

    /// Grab the current frame at the video's native resolution.
    pub fn capture(&mut self, format: ImageFormat) -> Result<CapturedImage, CameraError> {
        let (width, height) = match self.stream.video_size() {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(CameraError::NotReady),
        };

        self.stream.snapshot(width, height, format)
    }
}

impl<S: MediaStream> Deref for StreamGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.stream
    }
}

impl<S: MediaStream> DerefMut for StreamGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: MediaStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        tracing::debug!("releasing camera stream");
        self.stream.stop_tracks();
    }
}
