//! Canonical text rendering of a [SignalSet].
//!
//! The canonical form is what signalset files are committed as: one command
//! block per diagnostic request, one line per signal, with empty and default
//! properties filtered out so that edits produce small, reviewable diffs.
//!
//! ```text
//! { "commands": [
//! { "hdr": "7E0", "cmd": {"22":"F40C"}, "freq": 1,
//!   "signals": [
//!     {"id": "RPM", "path": "", "fmt": {"len": 16, "unit": "rpm"}, "name": "Engine RPM"}
//!   ]}
//! ]}
//! ```
//!
//! Rendering is a pure function of the document: no sorting, no rounding, and
//! serializing the same document twice yields the same text.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{
    document::{Command, SignalSet},
    keys,
    signal::{Format, Signal},
};

/// Options for [serialize_with].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanonicalConfig {
    /// Right-pad signal `id` and `path` values to the widest one in their command,
    /// so the signal lines of a command line up in columns.
    pub align_columns: bool,
}

/// Renders `doc` in canonical form with the default [CanonicalConfig].
pub fn serialize(doc: &SignalSet) -> String {
    serialize_with(doc, &CanonicalConfig::default())
}

/// Renders `doc` in canonical form.
pub fn serialize_with(doc: &SignalSet, config: &CanonicalConfig) -> String {
    let commands: Vec<String> = doc
        .commands
        .iter()
        .map(|command| render_command(command, config))
        .collect();

    format!("{{ \"commands\": [\n{}\n]}}\n", commands.join(",\n"))
}

impl fmt::Display for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

fn render_command(command: &Command, config: &CanonicalConfig) -> String {
    let properties: Vec<String> = command
        .properties()
        .iter()
        .filter(|(key, value)| keeps_property(key, value))
        .map(|(key, value)| format!("{}: {}", string_literal(key), literal(value)))
        .collect();

    let signals = render_signals(&command.signals, config);

    if properties.is_empty() {
        format!("{{\n  \"signals\": [\n{}\n  ]}}", signals)
    } else {
        format!(
            "{{ {},\n  \"signals\": [\n{}\n  ]}}",
            properties.join(", "),
            signals
        )
    }
}

/// Empty strings and a cleared flow-control flag carry no information and are dropped.
fn keeps_property(key: &str, value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Bool(false) => key != keys::FLOW_CONTROL,
        _ => true,
    }
}

fn render_signals(signals: &[Signal], config: &CanonicalConfig) -> String {
    let (id_width, path_width) = if config.align_columns {
        signals.iter().fold((0, 0), |(id, path), signal| {
            (
                id.max(char_len(signal.id.as_deref())),
                path.max(char_len(signal.path.as_deref())),
            )
        })
    } else {
        (0, 0)
    };

    signals
        .iter()
        .map(|signal| render_signal(signal, id_width, path_width))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn render_signal(signal: &Signal, id_width: usize, path_width: usize) -> String {
    let id = pad(signal.id.as_deref().unwrap_or(""), id_width);
    let path = pad(signal.path.as_deref().unwrap_or(""), path_width);
    let name = match &signal.name {
        Some(name) => string_literal(name),
        None => "null".to_string(),
    };

    let mut line = format!(
        "    {{\"id\": {}, \"path\": {}, \"fmt\": {{{}}}, \"name\": {}",
        string_literal(&id),
        string_literal(&path),
        render_format(signal.format.as_ref()),
        name
    );

    if let Some(metric) = signal.suggested_metric.as_deref().filter(|m| !m.is_empty()) {
        line.push_str(", \"suggestedMetric\": ");
        line.push_str(&string_literal(metric));
    }

    line.push('}');
    line
}

fn render_format(format: Option<&Format>) -> String {
    let Some(format) = format else {
        return String::new();
    };

    format
        .present()
        .map(|(key, value)| format!("{}: {}", string_literal(key), literal(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn char_len(s: Option<&str>) -> usize {
    s.map_or(0, |s| s.chars().count())
}

fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

/// Compact JSON literal, matching what a browser's `JSON.stringify` emits.
fn literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, value);
    out
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&number_literal(n)),
        Value::String(s) => out.push_str(&string_literal(s)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_literal(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&string_literal(key));
                out.push(':');
                write_literal(out, item);
            }
            out.push('}');
        }
    }
}

fn string_literal(s: &str) -> String {
    Value::from(s).to_string()
}

/// Integers print exactly. Floats print the way `JSON.stringify` prints a number.
fn number_literal(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => float_literal(f).unwrap_or_else(|| n.to_string()),
        _ => n.to_string(),
    }
}

/// Shortest round-trip digits laid out like `Number.prototype.toString`:
/// positional notation from `1e-6` up to `1e21`, exponent form outside it.
fn float_literal(f: f64) -> Option<String> {
    if f == 0.0 {
        return Some("0".to_string());
    }

    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let k = digits.len() as i32;
    let n = exponent + 1;
    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(n.unsigned_abs() as usize), digits)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{}", exponent.unsigned_abs())
        } else {
            format!("{first}.{rest}e{sign}{}", exponent.unsigned_abs())
        }
    };

    Some(if f < 0.0 { format!("-{body}") } else { body })
}
