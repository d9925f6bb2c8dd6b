//! Conversions between JavaScript values and core types.
//!
//! Everything that can fail on a `&str` or number is parsed here so the
//! bindings stay thin. Error values crossing into JavaScript are plain
//! strings prefixed with the error's taxonomy code, e.g.
//! `"TooSmall: File is too small (500 bytes); the minimum is 1024 bytes"`.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use retouch_core::EditorError;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Convert any displayable error into a JavaScript string value.
pub(crate) fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn editor_error(err: EditorError) -> JsValue {
    JsValue::from_str(&describe_editor_error(&err))
}

/// `"<code>: <message>"`
pub(crate) fn describe_editor_error(err: &EditorError) -> String {
    format!("{}: {}", err.code(), err)
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// Parse a name such as `"rect"`, `"brightness"` or `"jpeg"`.
pub(crate) fn parse_name<T>(name: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    name.parse::<T>().map_err(|e| e.to_string())
}

/// Milliseconds since the epoch (as from `Date.now()`) to a UTC timestamp.
pub(crate) fn timestamp_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}
