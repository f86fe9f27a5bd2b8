//! Web worker entry point for edgeview edge detection.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives one RGBA frame per `postMessage`, runs the Sobel
//! detector on it, and posts the edge map back.
//!
//! Pixels travel as raw typed arrays in both directions. The worker owns
//! a single [`EdgeDetector`] for its lifetime, so the luminance and
//! magnitude buffers are reused from frame to frame while the frame size
//! stays the same.

use edgeview_pipeline::diagnostics::{Clock, WebClock};
use edgeview_pipeline::{DetectError, EdgeDetector, EdgeMap, Parameters};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// A decoded detection request.
#[derive(Debug)]
struct Request {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    parameters: Parameters,
    generation: f64,
}

/// Message protocol: the main thread sends a JS object with:
/// - `pixels`: `Uint8ClampedArray` (e.g. `ImageData.data`) or `Uint8Array`
///   holding `width * height * 4` RGBA bytes
/// - `width`, `height`: `f64` frame dimensions
/// - `threshold`: `f64` edge threshold, clamped to 0-255 (optional,
///   defaults to [`Parameters::DEFAULT_THRESHOLD`])
/// - `generation`: `f64` generation counter (passed through to response)
///
/// On success the worker responds with a JS object containing:
/// - `generation`: `f64` matching the request generation
/// - `ok`: `true`
/// - `width`, `height`: `f64` edge map dimensions
/// - `pixels`: `Uint8ClampedArray` with the RGBA edge map, ready for
///   `new ImageData(pixels, width, height)`
///
/// On error the worker responds with:
/// - `generation`: `f64`
/// - `ok`: `false`
/// - `errorJson`: `String` with the JSON-serialized `DetectError`
///
/// Dropping responses from superseded generations is up to the caller.
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    let mut detector = EdgeDetector::new();
    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&mut detector, &event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // leak, lives for the worker lifetime
}

/// Handle an incoming message from the main thread.
fn handle_message(detector: &mut EdgeDetector, event: &web_sys::MessageEvent) {
    let data = event.data();
    let generation = get(&data, "generation")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    let request = match parse_request(&data, generation) {
        Ok(r) => r,
        Err(e) => {
            post_error(generation, &e);
            return;
        }
    };

    let clock = WebClock;
    let start = clock.now();
    let outcome = detector.detect(
        &request.pixels,
        request.width,
        request.height,
        &request.parameters,
    );

    match outcome {
        Ok(edges) => {
            web_sys::console::debug_1(&JsValue::from_str(&format!(
                "edgeview: {}x{} frame in {:.2}ms",
                request.width,
                request.height,
                clock.elapsed(&start).as_secs_f64() * 1000.0,
            )));
            post_success(request.generation, &edges);
        }
        Err(e) => post_error(request.generation, &e),
    }
}

/// Read a property of the message object, treating `undefined` as absent.
fn get(data: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(data, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined())
}

/// Convert the message object into a [`Request`].
fn parse_request(data: &JsValue, generation: f64) -> Result<Request, DetectError> {
    let pixels_val =
        get(data, "pixels").ok_or_else(|| invalid("missing pixels field".to_string()))?;
    let pixels = if let Some(clamped) = pixels_val.dyn_ref::<js_sys::Uint8ClampedArray>() {
        clamped.to_vec()
    } else if let Some(plain) = pixels_val.dyn_ref::<js_sys::Uint8Array>() {
        plain.to_vec()
    } else {
        return Err(invalid(
            "pixels is not a Uint8ClampedArray or Uint8Array".to_string(),
        ));
    };

    let width = number_field(data, "width").and_then(|v| dimension_from_f64("width", v))?;
    let height = number_field(data, "height").and_then(|v| dimension_from_f64("height", v))?;
    let threshold = match get(data, "threshold") {
        None => Parameters::DEFAULT_THRESHOLD,
        Some(v) => threshold_from_f64(
            v.as_f64()
                .ok_or_else(|| invalid("threshold is not a number".to_string()))?,
        ),
    };

    Ok(Request {
        pixels,
        width,
        height,
        parameters: Parameters::new(threshold),
        generation,
    })
}

fn number_field(data: &JsValue, key: &str) -> Result<f64, DetectError> {
    get(data, key)
        .ok_or_else(|| invalid(format!("missing {key} field")))?
        .as_f64()
        .ok_or_else(|| invalid(format!("{key} is not a number")))
}

fn invalid(msg: String) -> DetectError {
    DetectError::InvalidConfig(msg)
}

/// Convert a JS number to a frame dimension.
///
/// Zero passes through so the detector reports it as
/// [`DetectError::InvalidDimensions`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension_from_f64(name: &str, value: f64) -> Result<u32, DetectError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        // Checked integral and in range above.
        Ok(value as u32)
    } else {
        Err(invalid(format!("{name} must be a non-negative integer, got {value}")))
    }
}

/// Convert a JS number to a threshold. Out-of-range values saturate and
/// are clamped again by [`Parameters::effective_threshold`]; NaN maps to 0.
#[allow(clippy::cast_possible_truncation)]
fn threshold_from_f64(value: f64) -> i32 {
    value.round() as i32
}

/// Post a successful edge map back to the main thread.
fn post_success(generation: f64, edges: &EdgeMap) {
    let dims = edges.dimensions();
    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        js_sys::Reflect::set(&response, &JsValue::from_str(key), val)
            .expect_throw("failed to set response field");
    };

    set("generation", &JsValue::from_f64(generation));
    set("ok", &JsValue::from_bool(true));
    set("width", &JsValue::from_f64(f64::from(dims.width)));
    set("height", &JsValue::from_f64(f64::from(dims.height)));
    set(
        "pixels",
        &js_sys::Uint8ClampedArray::from(edges.as_raw()),
    );

    post(&response);
}

/// Post an error response back to the main thread.
fn post_error(generation: f64, error: &DetectError) {
    web_sys::console::warn_1(&JsValue::from_str(&format!("edgeview: {error}")));

    let error_json = serde_json::to_string(error)
        .unwrap_or_else(|ser_err| format!("\"serialization error: {ser_err}\""));

    let response = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("generation"),
        &JsValue::from_f64(generation),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("ok"),
        &JsValue::from_bool(false),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("errorJson"),
        &JsValue::from_str(&error_json),
    );

    post(&response);
}

fn post(response: &js_sys::Object) {
    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>()
        && let Err(e) = global.post_message(response)
    {
        web_sys::console::error_2(&JsValue::from_str("edgeview: postMessage failed"), &e);
    }
}
