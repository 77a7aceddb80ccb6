//! WASM bindings for the `signalset` editor core.
//!
//! The browser editor keeps a JSON text view and a structured form view of the
//! same signalset. This crate exposes [`WasmSession`], which owns both sides:
//!
//! - **Text edits** go through [`WasmSession::set_text`]. The text is kept as
//!   typed; the structured document only follows when it parses.
//! - **Structured edits** (`addCommand`, `setFormatEntry`, …) produce a new
//!   document snapshot and regenerate the text in canonical form.
//! - **Byte layout** for the visualizer comes from [`WasmSession::byte_map`].
//!
//! ```text
//! // const session = new WasmSession(text, false);
//! // session.addSignal(0);
//! // session.setFormatEntry(0, 1, "bix", 16);
//! // textarea.value = session.text;
//! // const bytes = session.byteMap(0); // [[0], [0], [1], ...]
//! ```
//!
//! Errors cross the boundary as JS strings.

mod convert;

use serde_json::Value;
use signalset::{CanonicalConfig, EditSession, edit, parse, serde::SignalSetDef, serialize_with};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "panic-hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "logging")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::warn!("logger already initialized");
    }
}

/// Canonicalizes signalset text in one call.
#[wasm_bindgen]
pub fn canonicalize(text: &str, align_columns: Option<bool>) -> Result<String, JsValue> {
    let doc = parse(text).map_err(convert::error_to_js)?;
    Ok(serialize_with(&doc, &config(align_columns)))
}

fn config(align_columns: Option<bool>) -> CanonicalConfig {
    CanonicalConfig {
        align_columns: align_columns.unwrap_or_default(),
    }
}

/// An editing session over one signalset document.
#[wasm_bindgen]
pub struct WasmSession {
    session: EditSession,
}

#[wasm_bindgen]
impl WasmSession {
    /// Starts a session from text. Text that does not parse is kept and reported through `error`.
    #[wasm_bindgen(constructor)]
    pub fn new(text: &str, align_columns: Option<bool>) -> WasmSession {
        WasmSession {
            session: EditSession::from_text(text, config(align_columns)),
        }
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, text: &str) -> Result<(), JsValue> {
        self.session.set_text(text).map_err(convert::error_to_js)
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.session.text().to_string()
    }

    /// Message of the last failed parse, if the text currently does not parse.
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.session.error().map(ToString::to_string)
    }

    /// The current document as a plain JS object.
    pub fn document(&self) -> Result<JsValue, JsValue> {
        let doc = self.session.document();
        convert::to_js(&SignalSetDef::from(doc.as_ref()))
    }

    /// Occupant signal indices for each byte of a command's payload.
    #[wasm_bindgen(js_name = byteMap)]
    pub fn byte_map(&self, command: usize) -> Result<JsValue, JsValue> {
        let map = self
            .session
            .byte_map(command)
            .map_err(convert::error_to_js)?;
        convert::byte_map_to_js(&map)
    }

    /// Bytes of a command's payload occupied by more than one signal.
    #[wasm_bindgen(js_name = sharedBytes)]
    pub fn shared_bytes(&self, command: usize) -> Result<JsValue, JsValue> {
        let map = self
            .session
            .byte_map(command)
            .map_err(convert::error_to_js)?;
        convert::to_js(&map.shared_bytes().collect::<Vec<_>>())
    }

    #[wasm_bindgen(js_name = addCommand)]
    pub fn add_command(&mut self) -> Result<(), JsValue> {
        self.session
            .apply(edit::add_command)
            .map_err(convert::error_to_js)
    }

    #[wasm_bindgen(js_name = removeCommand)]
    pub fn remove_command(&mut self, command: usize) -> Result<(), JsValue> {
        self.session
            .apply(|doc| edit::remove_command(doc, command))
            .map_err(convert::error_to_js)
    }

    #[wasm_bindgen(js_name = addSignal)]
    pub fn add_signal(&mut self, command: usize) -> Result<(), JsValue> {
        self.session
            .apply(|doc| edit::add_signal(doc, command))
            .map_err(convert::error_to_js)
    }

    #[wasm_bindgen(js_name = removeSignal)]
    pub fn remove_signal(&mut self, command: usize, signal: usize) -> Result<(), JsValue> {
        self.session
            .apply(|doc| edit::remove_signal(doc, command, signal))
            .map_err(convert::error_to_js)
    }

    #[wasm_bindgen(js_name = setCommandProperty)]
    pub fn set_command_property(
        &mut self,
        command: usize,
        key: &str,
        value: JsValue,
    ) -> Result<(), JsValue> {
        let value: Value = convert::js_to_json(value)?;
        self.session
            .apply(|doc| edit::set_command_property(doc, command, key, value))
            .map_err(convert::error_to_js)
    }

    /// Sets `id`, `name`, `path` or `suggestedMetric` of a signal. `undefined` clears it.
    #[wasm_bindgen(js_name = setSignalField)]
    pub fn set_signal_field(
        &mut self,
        command: usize,
        signal: usize,
        field: &str,
        value: Option<String>,
    ) -> Result<(), JsValue> {
        let field = convert::signal_field(field)?;
        self.session
            .apply(|doc| edit::set_signal_field(doc, command, signal, field, value))
            .map_err(convert::error_to_js)
    }

    #[wasm_bindgen(js_name = setFormatEntry)]
    pub fn set_format_entry(
        &mut self,
        command: usize,
        signal: usize,
        key: &str,
        value: JsValue,
    ) -> Result<(), JsValue> {
        let value = convert::js_to_format_value(value)?;
        self.session
            .apply(|doc| edit::set_format_entry(doc, command, signal, key, value))
            .map_err(convert::error_to_js)
    }
}
