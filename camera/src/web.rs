//! Browser backend: `getUserMedia` for the camera, a hidden canvas for the
//! snapshot, `window.alert` for messages.

use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    CanvasRenderingContext2d, Document, DomException, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlVideoElement, MediaStreamConstraints, MediaStreamTrack,
    Window,
};

use crate::client::HttpProxyClient;
use crate::device::{CameraError, MediaConstraints, MediaDevices, MediaStream};
use crate::image::{CapturedImage, ImageFormat};
use crate::notify::Notifier;
use crate::preview::{CameraPreview, CaptureConfig};

fn describe(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

/// Map a rejected `getUserMedia`/`play` promise to a [`CameraError`].
pub fn camera_error(value: JsValue) -> CameraError {
    match value.dyn_ref::<DomException>().map(|e| e.name()) {
        Some(name) if name == "NotAllowedError" || name == "SecurityError" => {
            CameraError::PermissionDenied(name)
        }
        _ => CameraError::Unavailable(describe(&value)),
    }
}

fn surface_error(value: JsValue) -> CameraError {
    CameraError::Surface(describe(&value))
}

pub struct WebMediaDevices {
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
}

impl WebMediaDevices {
    pub fn new(video: HtmlVideoElement, canvas: HtmlCanvasElement) -> WebMediaDevices {
        WebMediaDevices { video, canvas }
    }
}

#[async_trait(?Send)]
impl MediaDevices for WebMediaDevices {
    type Stream = WebStream;

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<WebStream, CameraError> {
        let window = web_sys::window()
            .ok_or_else(|| CameraError::Unavailable(String::from("no window")))?;
        let devices = window.navigator().media_devices().map_err(camera_error)?;

        let video = Object::new();
        Reflect::set(
            &video,
            &JsValue::from_str("facingMode"),
            &JsValue::from_str(constraints.facing_mode.as_str()),
        )
        .map_err(camera_error)?;

        let request = MediaStreamConstraints::new();
        request.set_video(&video);
        request.set_audio(&JsValue::from_bool(constraints.audio));

        let promise = devices
            .get_user_media_with_constraints(&request)
            .map_err(camera_error)?;
        let stream: web_sys::MediaStream = JsFuture::from(promise)
            .await
            .map_err(camera_error)?
            .dyn_into()
            .map_err(camera_error)?;

        let mut stream = WebStream::new(stream, self.video.clone(), self.canvas.clone());

        let played = match self.video.play() {
            Ok(promise) => JsFuture::from(promise).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = played {
            stream.stop_tracks();
            return Err(camera_error(e));
        }

        Ok(stream)
    }
}

pub struct WebStream {
    stream: web_sys::MediaStream,
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    stopped: bool,
}

impl WebStream {
    /// Attach an already granted stream to `video`.
    pub fn new(
        stream: web_sys::MediaStream,
        video: HtmlVideoElement,
        canvas: HtmlCanvasElement,
    ) -> WebStream {
        video.set_src_object(Some(&stream));
        WebStream {
            stream,
            video,
            canvas,
            stopped: false,
        }
    }
}

impl MediaStream for WebStream {
    fn video_size(&self) -> Option<(u32, u32)> {
        if self.stopped {
            return None;
        }
        Some((self.video.video_width(), self.video.video_height()))
    }

    fn snapshot(
        &mut self,
        width: u32,
        height: u32,
        format: ImageFormat,
    ) -> Result<CapturedImage, CameraError> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);

        let context: CanvasRenderingContext2d = self
            .canvas
            .get_context("2d")
            .map_err(surface_error)?
            .ok_or_else(|| CameraError::Surface(String::from("no 2d context")))?
            .dyn_into()
            .map_err(|_| CameraError::Surface(String::from("unexpected context type")))?;

        context
            .draw_image_with_html_video_element_and_dw_and_dh(
                &self.video,
                0.0,
                0.0,
                width as f64,
                height as f64,
            )
            .map_err(surface_error)?;

        let data_uri = self
            .canvas
            .to_data_url_with_type(format.mime_type())
            .map_err(surface_error)?;

        Ok(CapturedImage::from_data_uri(data_uri))
    }

    fn stop_tracks(&mut self) {
        if self.stopped {
            return;
        }

        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        self.video.set_src_object(None);
        self.stopped = true;
    }
}

pub struct WebNotifier {
    window: Window,
}

impl WebNotifier {
    pub fn new(window: Window) -> WebNotifier {
        WebNotifier { window }
    }
}

impl Notifier for WebNotifier {
    fn alert(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            tracing::warn!("alert failed: {}", describe(&e));
        }
    }
}

type WebPreview = CameraPreview<WebMediaDevices, HttpProxyClient, WebNotifier>;

/// The elements of the capture page, looked up by id.
pub struct Page {
    pub start: HtmlElement,
    pub stop: HtmlElement,
    pub shutter: HtmlButtonElement,
    pub send: HtmlElement,
    pub video: HtmlVideoElement,
    pub canvas: HtmlCanvasElement,
    pub captured_panel: HtmlElement,
    pub captured: HtmlImageElement,
    pub response_panel: HtmlElement,
    pub response: HtmlElement,
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{} has the wrong type", id)))
}

impl Page {
    pub fn find(document: &Document) -> Result<Page, JsValue> {
        Ok(Page {
            start: element(document, "start")?,
            stop: element(document, "stop")?,
            shutter: element(document, "shutter")?,
            send: element(document, "send")?,
            video: element(document, "preview")?,
            canvas: element(document, "surface")?,
            captured_panel: element(document, "captured-panel")?,
            captured: element(document, "captured")?,
            response_panel: element(document, "response-panel")?,
            response: element(document, "response")?,
        })
    }
}

struct App {
    page: Page,
    preview: WebPreview,
}

impl App {
    fn render(&self) {
        let preview = &self.preview;

        let streaming = preview.is_streaming();
        self.page.start.set_hidden(streaming);
        self.page.stop.set_hidden(!streaming);
        self.page.shutter.set_disabled(!streaming);

        match preview.captured_image() {
            Some(image) => {
                self.page.captured.set_src(image.data_uri());
                self.page.captured_panel.set_hidden(false);
            }
            None => self.page.captured_panel.set_hidden(true),
        }

        match preview.server_response() {
            Some(text) => {
                self.page.response.set_text_content(Some(&text));
                self.page.response_panel.set_hidden(false);
            }
            None => self.page.response_panel.set_hidden(true),
        }
    }
}

fn on_click<F, Fut>(target: &HtmlElement, app: &Rc<App>, handler: F)
where
    F: Fn(Rc<App>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let app = app.clone();
    let closure = Closure::<dyn FnMut()>::new(move || {
        let app = app.clone();
        let action = handler(app.clone());
        spawn_local(async move {
            action.await;
            app.render();
        });
    });
    target.set_onclick(Some(closure.as_ref().unchecked_ref()));
    closure.forget();
}

/// Absolute URLs are kept, paths are joined to the page origin.
pub fn resolve_endpoint(window: &Window, endpoint: &str) -> Result<String, JsValue> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Ok(endpoint.to_string());
    }
    Ok(format!("{}{}", window.location().origin()?, endpoint))
}

/// Route panics and `tracing` events to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

/// Wire the capture page to the proxy at `endpoint`.
#[wasm_bindgen]
pub fn mount(endpoint: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let page = Page::find(&document)?;

    let config = CaptureConfig {
        endpoint: resolve_endpoint(&window, endpoint)?,
        ..CaptureConfig::default()
    };
    let preview = CameraPreview::new(
        WebMediaDevices::new(page.video.clone(), page.canvas.clone()),
        HttpProxyClient::new(config.endpoint.clone()),
        WebNotifier::new(window.clone()),
        config,
    );

    let app = Rc::new(App { page, preview });
    app.render();

    on_click(&app.page.start, &app, |app| async move {
        let _ = app.preview.start_camera().await;
    });
    on_click(&app.page.stop, &app, |app| async move {
        app.preview.stop_camera();
    });
    on_click(&app.page.shutter, &app, |app| async move {
        app.preview.capture_image();
    });
    on_click(&app.page.send, &app, |app| async move {
        let _ = app.preview.send_image_to_server().await;
    });

    // Leaving the page releases the camera
    let on_hide = {
        let app = app.clone();
        Closure::<dyn FnMut()>::new(move || app.preview.stop_camera())
    };
    window.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())?;
    on_hide.forget();

    Ok(())
}
