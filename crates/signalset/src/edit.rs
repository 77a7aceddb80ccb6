//! Copy-on-write edits of a [SignalSet].
//!
//! Every edit takes the current document by reference and returns a new one.
//! The input is never touched, so a snapshot handed to a reader stays valid
//! while the next one is being built.

use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::{
    document::{Command, SignalSet},
    errors::EditError,
    keys,
    signal::{Format, FormatValue, Signal},
};

const NEW_SIGNAL_PREFIX: &str = "NEW_SIGNAL_";

/// A signal member that holds a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalField {
    Id,
    Name,
    Path,
    SuggestedMetric,
}

/// Appends a command with placeholder header, command code and frequency.
pub fn add_command(doc: &SignalSet) -> Result<SignalSet, EditError> {
    let mut next = doc.clone();
    next.commands.push(template_command()?);
    Ok(next)
}

/// Removes the command at `command`.
pub fn remove_command(doc: &SignalSet, command: usize) -> Result<SignalSet, EditError> {
    doc.command(command)?;
    let mut next = doc.clone();
    next.commands.remove(command);
    Ok(next)
}

/// Appends a placeholder 8-bit signal to `command`, with an id unused in that command.
pub fn add_signal(doc: &SignalSet, command: usize) -> Result<SignalSet, EditError> {
    let mut next = doc.clone();
    let target = next.command_mut(command)?;
    let signal = template_signal(fresh_signal_id(target))?;
    target.signals.push(signal);
    Ok(next)
}

/// Removes signal `signal` of `command`.
pub fn remove_signal(doc: &SignalSet, command: usize, signal: usize) -> Result<SignalSet, EditError> {
    doc.command(command)?.signal(command, signal)?;
    let mut next = doc.clone();
    next.commands[command].signals.remove(signal);
    Ok(next)
}

/// Sets a command property. `signals` is reserved.
pub fn set_command_property(
    doc: &SignalSet,
    command: usize,
    key: &str,
    value: Value,
) -> Result<SignalSet, EditError> {
    let mut next = doc.clone();
    next.command_mut(command)?.set_property(key, value)?;
    Ok(next)
}

/// Sets or clears one string member of a signal.
pub fn set_signal_field(
    doc: &SignalSet,
    command: usize,
    signal: usize,
    field: SignalField,
    value: Option<String>,
) -> Result<SignalSet, EditError> {
    let mut next = doc.clone();
    let target = next.command_mut(command)?.signal_mut(command, signal)?;

    let slot = match field {
        SignalField::Id => &mut target.id,
        SignalField::Name => &mut target.name,
        SignalField::Path => &mut target.path,
        SignalField::SuggestedMetric => &mut target.suggested_metric,
    };
    *slot = value;

    Ok(next)
}

/// Sets one format entry of a signal, creating the format if the signal has none.
pub fn set_format_entry(
    doc: &SignalSet,
    command: usize,
    signal: usize,
    key: &str,
    value: FormatValue,
) -> Result<SignalSet, EditError> {
    let mut next = doc.clone();
    let target = next.command_mut(command)?.signal_mut(command, signal)?;
    target
        .format
        .get_or_insert_with(Format::new)
        .insert(key, value)?;
    Ok(next)
}

fn template_command() -> Result<Command, EditError> {
    let mut properties = Map::new();
    properties.insert(keys::HEADER.to_string(), json!("000"));
    properties.insert(keys::COMMAND_CODE.to_string(), json!({"22": "0000"}));
    properties.insert(keys::FREQUENCY.to_string(), json!(1));

    Command::from_properties(properties, Vec::new())
}

fn template_signal(id: String) -> Result<Signal, EditError> {
    let mut format = Format::new();
    format.insert(keys::BIT_LENGTH, 8u64)?;
    format.insert(keys::UNIT, "scalar")?;

    Ok(Signal {
        path: Some(String::new()),
        ..Signal::new(id, "New Signal").with_format(format)
    })
}

/// `NEW_SIGNAL_<n>` with the smallest `n >= 1` not already taken in `command`.
pub fn fresh_signal_id(command: &Command) -> String {
    let taken: BTreeSet<usize> = command
        .signals
        .iter()
        .filter_map(|s| s.id.as_deref()?.strip_prefix(NEW_SIGNAL_PREFIX))
        .filter_map(|suffix| {
            let n: usize = suffix.parse().ok()?;
            (n.to_string() == suffix).then_some(n)
        })
        .collect();

    let mut n = 1;
    while taken.contains(&n) {
        n += 1;
    }

    format!("{NEW_SIGNAL_PREFIX}{n}")
}
