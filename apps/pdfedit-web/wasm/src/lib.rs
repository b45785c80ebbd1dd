//! WASM entry points for the browser PDF editor
//!
//! [`session::EditorSession`] carries the stateful editing flow; the free
//! functions below wrap the stateless page tools (merge, split, watermark,
//! page numbers, crop, compress) for one-shot calls from JavaScript.

mod session;

pub use session::EditorSession;

use pdfedit_core::{CropRect, PageNumberOptions, PdfEditError, WatermarkOptions};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"pdfedit WASM initialized".into());
}

fn to_js(e: PdfEditError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_array(bytes: Vec<u8>) -> js_sys::Uint8Array {
    let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
    array.copy_from(&bytes);
    array
}

/// Merge documents in array order. `files` is an Array of Uint8Array.
#[wasm_bindgen(js_name = mergeFiles)]
pub fn merge_files(files: js_sys::Array) -> Result<js_sys::Uint8Array, JsValue> {
    let mut documents = Vec::with_capacity(files.length() as usize);
    for file in files.iter() {
        let bytes = js_sys::Uint8Array::new(&file).to_vec();
        documents.push(bytes);
    }
    pdfedit_core::merge_documents(documents)
        .map(to_array)
        .map_err(to_js)
}

/// Extract pages by selection string, e.g. "1-3, 5".
#[wasm_bindgen(js_name = splitFile)]
pub fn split_file(bytes: &[u8], ranges: &str) -> Result<js_sys::Uint8Array, JsValue> {
    let pages = pdfedit_core::parse_ranges(ranges).map_err(to_js)?;
    pdfedit_core::split_document(bytes, pages)
        .map(to_array)
        .map_err(to_js)
}

/// Stamp a diagonal translucent watermark on every page.
#[wasm_bindgen(js_name = watermarkFile)]
pub fn watermark_file(
    bytes: &[u8],
    text: &str,
    opacity: f64,
    font_size: f64,
) -> Result<js_sys::Uint8Array, JsValue> {
    let options = WatermarkOptions {
        text: text.to_string(),
        opacity,
        font_size,
    };
    pdfedit_core::add_watermark(bytes, &options)
        .map(to_array)
        .map_err(to_js)
}

/// Stamp page numbers along the bottom edge of every page.
#[wasm_bindgen(js_name = addPageNumbers)]
pub fn add_page_numbers(
    bytes: &[u8],
    font_size: f64,
    margin: f64,
    include_total: bool,
) -> Result<js_sys::Uint8Array, JsValue> {
    let options = PageNumberOptions {
        font_size,
        margin,
        include_total,
    };
    pdfedit_core::add_page_numbers(bytes, &options)
        .map(to_array)
        .map_err(to_js)
}

/// Crop every page to the given PDF-space rectangle.
#[wasm_bindgen(js_name = cropFile)]
pub fn crop_file(
    bytes: &[u8],
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<js_sys::Uint8Array, JsValue> {
    let rect = CropRect {
        x,
        y,
        width,
        height,
    };
    pdfedit_core::crop_document(bytes, rect, None)
        .map(to_array)
        .map_err(to_js)
}

/// Structural re-save: prune unreferenced objects, compress streams.
#[wasm_bindgen(js_name = compressFile)]
pub fn compress_file(bytes: &[u8]) -> Result<js_sys::Uint8Array, JsValue> {
    pdfedit_core::compress_document(bytes)
        .map(|(out, _stats)| to_array(out))
        .map_err(to_js)
}

/// Page count of a document, without opening a session.
#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfedit_core::get_page_count(bytes).map_err(to_js)
}
