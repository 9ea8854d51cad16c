use wasm_bindgen::JsValue;

// The host page has no logger beyond the browser console, so every channel
// goes through web_sys::console. Panics are covered separately by
// console_error_panic_hook at startup.

pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

pub(crate) fn debug(message: &str) {
    web_sys::console::debug_1(&JsValue::from_str(message));
}
