//! The signalset document: commands, their properties and their signals.

use serde_json::{Map, Value};

use crate::{errors::EditError, keys, signal::Signal};

/// Root of a signalset document: an ordered list of diagnostic commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    pub commands: Vec<Command>,
}

impl SignalSet {
    pub fn new(commands: Vec<Command>) -> Self {
        SignalSet { commands }
    }

    pub fn command(&self, index: usize) -> Result<&Command, EditError> {
        let len = self.commands.len();
        self.commands
            .get(index)
            .ok_or(EditError::CommandOutOfRange { index, len })
    }

    pub fn command_mut(&mut self, index: usize) -> Result<&mut Command, EditError> {
        let len = self.commands.len();
        self.commands
            .get_mut(index)
            .ok_or(EditError::CommandOutOfRange { index, len })
    }

    /// Total number of signals across all commands.
    pub fn signal_count(&self) -> usize {
        self.commands.iter().map(|c| c.signals.len()).sum()
    }
}

/// One diagnostic request definition.
///
/// Properties are kept in insertion order and are opaque to the core, apart
/// from a handful of typed accessors for the keys every signalset uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    properties: Map<String, Value>,
    pub signals: Vec<Signal>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a command from ordered properties. A `signals` entry is not a property and is rejected.
    pub fn from_properties(
        properties: Map<String, Value>,
        signals: Vec<Signal>,
    ) -> Result<Self, EditError> {
        if properties.contains_key(keys::SIGNALS) {
            return Err(EditError::ReservedKey(keys::SIGNALS.to_string()));
        }

        Ok(Command {
            properties,
            signals,
        })
    }

    /// Every property except the signal list, in insertion order.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Sets a property. Existing keys keep their position; new keys go last.
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, EditError> {
        let key = key.into();
        if key == keys::SIGNALS {
            return Err(EditError::ReservedKey(key));
        }

        Ok(self.properties.insert(key, value))
    }

    /// Removes a property, keeping the order of the others.
    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }

    pub fn signal(&self, command: usize, index: usize) -> Result<&Signal, EditError> {
        let len = self.signals.len();
        self.signals.get(index).ok_or(EditError::SignalOutOfRange {
            command,
            index,
            len,
        })
    }

    pub fn signal_mut(&mut self, command: usize, index: usize) -> Result<&mut Signal, EditError> {
        let len = self.signals.len();
        self.signals.get_mut(index).ok_or(EditError::SignalOutOfRange {
            command,
            index,
            len,
        })
    }

    pub fn header(&self) -> Option<&str> {
        self.str_property(keys::HEADER)
    }

    pub fn receive_address(&self) -> Option<&str> {
        self.str_property(keys::RECEIVE_ADDRESS)
    }

    pub fn extended_address(&self) -> Option<&str> {
        self.str_property(keys::EXTENDED_ADDRESS)
    }

    pub fn tester_address(&self) -> Option<&str> {
        self.str_property(keys::TESTER_ADDRESS)
    }

    /// Polling frequency in seconds.
    pub fn frequency(&self) -> Option<f64> {
        self.property(keys::FREQUENCY).and_then(Value::as_f64)
    }

    /// Flow-control flag. Only a boolean counts.
    pub fn flow_control(&self) -> Option<bool> {
        self.property(keys::FLOW_CONTROL).and_then(Value::as_bool)
    }

    /// Service-to-parameter mapping, e.g. `{"22": "F40C"}`.
    pub fn command_code(&self) -> Option<&Map<String, Value>> {
        self.property(keys::COMMAND_CODE).and_then(Value::as_object)
    }

    fn str_property(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }
}
