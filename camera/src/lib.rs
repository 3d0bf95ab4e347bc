//! Camera capture flow for the product search page.
//!
//! The flow itself ([`preview::CameraPreview`]) is platform independent and
//! talks to the camera, the drawing surface and the user through the traits
//! in [`device`] and [`notify`]. The browser implementation lives in `web`
//! and is only built for `wasm32`.

pub mod client;
pub mod device;
pub mod image;
pub mod notify;
pub mod preview;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use client::{HttpProxyClient, ProxyClient, SubmitError};
pub use device::{CameraError, FacingMode, MediaConstraints, MediaDevices, MediaStream, StreamGuard};
pub use image::{CapturedImage, ImageFormat};
pub use notify::Notifier;
pub use preview::{CameraPreview, CaptureConfig, Phase, ResponseDisplay};
