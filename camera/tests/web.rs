//! Browser tests for the web backend.
//!
//! Run with: `wasm-pack test --headless --chrome camera`

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{
    Document, DomException, HtmlCanvasElement, HtmlVideoElement, MediaStreamTrack,
    MediaStreamTrackState,
};

use camera_capture::web::{camera_error, resolve_endpoint, Page, WebStream};
use camera_capture::{CameraError, MediaStream};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn create<T: JsCast>(tag: &str) -> T {
    document().create_element(tag).unwrap().dyn_into::<T>().unwrap()
}

#[wasm_bindgen_test]
fn refused_permission_maps_to_permission_denied() {
    for name in ["NotAllowedError", "SecurityError"] {
        let exception = DomException::new_with_message_and_name("refused", name).unwrap();

        assert_eq!(
            camera_error(exception.into()),
            CameraError::PermissionDenied(name.to_string())
        );
    }
}

#[wasm_bindgen_test]
fn other_failures_map_to_unavailable() {
    let exception =
        DomException::new_with_message_and_name("no camera", "NotFoundError").unwrap();
    assert!(matches!(
        camera_error(exception.into()),
        CameraError::Unavailable(_)
    ));

    let thrown = js_sys::Error::new("boom");
    assert_eq!(
        camera_error(thrown.into()),
        CameraError::Unavailable(String::from("boom"))
    );
}

#[wasm_bindgen_test]
fn endpoints_resolve_against_the_page_origin() {
    let window = web_sys::window().unwrap();
    let origin = window.location().origin().unwrap();

    assert_eq!(
        resolve_endpoint(&window, "/api/vision").unwrap(),
        format!("{}/api/vision", origin)
    );
    assert_eq!(
        resolve_endpoint(&window, "https://proxy.test/api/vision").unwrap(),
        "https://proxy.test/api/vision"
    );
}

#[wasm_bindgen_test]
fn stopping_a_stream_ends_its_tracks_once() {
    let source: HtmlCanvasElement = create("canvas");
    source.set_width(4);
    source.set_height(4);
    // Give the canvas a context before capturing it
    source.get_context("2d").unwrap().unwrap();
    let media = source.capture_stream().unwrap();

    let video: HtmlVideoElement = create("video");
    let mut stream = WebStream::new(media.clone(), video.clone(), create("canvas"));
    assert!(video.src_object().is_some());

    stream.stop_tracks();
    stream.stop_tracks();

    assert!(video.src_object().is_none());
    assert_eq!(stream.video_size(), None);
    for track in media.get_tracks().iter() {
        let track: MediaStreamTrack = track.dyn_into().unwrap();
        assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    }
}

#[wasm_bindgen_test]
fn the_capture_page_has_every_element() {
    let document = document();
    assert!(Page::find(&document).is_err());

    let container = document.create_element("div").unwrap();
    container.set_inner_html(include_str!("../www/index.html"));
    document.body().unwrap().append_child(&container).unwrap();

    let page = Page::find(&document);
    container.remove();

    let page = page.unwrap();
    assert!(page.stop.hidden());
    assert!(!page.start.hidden());
    assert!(page.shutter.disabled());
    assert!(page.captured_panel.hidden());
    assert!(page.response_panel.hidden());
}
