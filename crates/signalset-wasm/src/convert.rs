use serde::Serialize;
use serde_json::Value;
use signalset::{ByteMap, FormatValue, edit::SignalField, keys};
use wasm_bindgen::JsValue;

/// Converts any displayable error into a JS string value.
pub fn error_to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Serializes to plain JS objects and arrays (never `Map`), keeping key order.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(error_to_js)
}

/// Byte map as an array of arrays of signal indices, one inner array per byte.
pub fn byte_map_to_js(map: &ByteMap<'_>) -> Result<JsValue, JsValue> {
    let bytes: Vec<Vec<usize>> = map
        .iter()
        .map(|slot| slot.iter().copied().collect())
        .collect();

    to_js(&bytes)
}

pub fn js_to_json(value: JsValue) -> Result<Value, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(error_to_js)
}

/// Numbers go through [FormatValue::number] so that a NaN from a cleared numeric input stays distinguishable.
pub fn js_to_format_value(value: JsValue) -> Result<FormatValue, JsValue> {
    match value.as_f64() {
        Some(n) => Ok(FormatValue::number(n)),
        None => Ok(FormatValue::from_json(js_to_json(value)?)),
    }
}

pub fn signal_field(name: &str) -> Result<SignalField, JsValue> {
    match name {
        keys::ID => Ok(SignalField::Id),
        keys::NAME => Ok(SignalField::Name),
        keys::PATH => Ok(SignalField::Path),
        keys::SUGGESTED_METRIC => Ok(SignalField::SuggestedMetric),
        other => Err(JsValue::from_str(&format!("unknown signal field: {}", other))),
    }
}
