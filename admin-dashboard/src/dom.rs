//! Small DOM helpers shared by the page components

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

pub fn document() -> Result<Document, JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    Ok(window.document().ok_or("No document")?)
}

/// Fetch an element by id and cast it to the expected type
pub fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element: {}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("unexpected element type: {}", id)))
}

pub fn set_display(element: &HtmlElement, value: &str) -> Result<(), JsValue> {
    element.style().set_property("display", value)
}

/// Readable form of a JavaScript error value
pub fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Log to browser console
pub fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

pub fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

/// Log a failed page handler; handlers invoked from markup have nobody to
/// return the error to
pub fn report(context: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log_error(&format!("{}: {}", context, describe(&e)));
    }
}
