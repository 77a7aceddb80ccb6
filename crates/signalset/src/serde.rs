//! JSON wire shapes of a signalset and the [parse] entry point.
//!
//! The `*Def` types mirror the document as it appears in signalset files. They
//! are deserialized with serde and then converted into the core
//! [crate::document] types, which is where the bit-field checks happen.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    document::{Command, SignalSet},
    errors::{BitFieldError, StructuralError},
    keys,
    signal::{Format, FormatValue, Signal},
};

/// Top-level signalset document.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SignalSetDef {
    pub commands: Vec<CommandDef>,
}

/// One command: free-form properties plus its signals.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CommandDef {
    /// Every member except `signals`, in document order.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    /// `null` and a missing member both mean no signals.
    #[serde(default)]
    pub signals: Option<Vec<SignalDef>>,
}

/// One signal. Members not listed here are not part of the canonical form and are ignored.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SignalDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmt: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "suggestedMetric",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_metric: Option<String>,
}

/// Parses signalset text.
///
/// The text must be a JSON object with a `commands` array. Each command must be
/// an object, each signal an object with string `id`/`path`/`name`, and every
/// `bix`/`len` format entry a non-negative integer.
pub fn parse(text: &str) -> Result<SignalSet, StructuralError> {
    let mut root: Value =
        serde_json::from_str(text).map_err(|e| StructuralError::Syntax(e.to_string()))?;

    let commands = match root.get_mut(keys::COMMANDS).map(Value::take) {
        Some(Value::Array(commands)) => commands,
        _ => return Err(StructuralError::MissingCommands),
    };

    let commands = commands
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<CommandDef>(value).map_err(|e| {
                StructuralError::InvalidCommand {
                    index,
                    message: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let doc = SignalSet::try_from(SignalSetDef { commands })?;
    log::debug!(
        "parsed signalset: {} commands, {} signals",
        doc.commands.len(),
        doc.signal_count()
    );

    Ok(doc)
}

impl TryFrom<SignalSetDef> for SignalSet {
    type Error = StructuralError;

    fn try_from(value: SignalSetDef) -> Result<Self, Self::Error> {
        let mut commands = Vec::with_capacity(value.commands.len());

        for (index, def) in value.commands.into_iter().enumerate() {
            let signals = def
                .signals
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(signal, def)| {
                    Signal::try_from(def).map_err(|source| StructuralError::InvalidBitField {
                        command: index,
                        signal,
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let command = Command::from_properties(def.properties, signals).map_err(|e| {
                StructuralError::InvalidCommand {
                    index,
                    message: e.to_string(),
                }
            })?;

            commands.push(command);
        }

        Ok(SignalSet::new(commands))
    }
}

impl TryFrom<SignalDef> for Signal {
    type Error = BitFieldError;

    fn try_from(value: SignalDef) -> Result<Self, Self::Error> {
        Ok(Signal {
            id: value.id,
            name: value.name,
            path: value.path,
            suggested_metric: value.suggested_metric,
            format: value.fmt.map(Format::try_from).transpose()?,
        })
    }
}

impl TryFrom<Map<String, Value>> for Format {
    type Error = BitFieldError;

    fn try_from(value: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut format = Format::new();
        for (key, value) in value {
            format.insert(key, FormatValue::from_json(value))?;
        }

        Ok(format)
    }
}

impl From<&SignalSet> for SignalSetDef {
    fn from(value: &SignalSet) -> Self {
        SignalSetDef {
            commands: value.commands.iter().map(CommandDef::from).collect(),
        }
    }
}

impl From<&Command> for CommandDef {
    fn from(value: &Command) -> Self {
        CommandDef {
            properties: value.properties().clone(),
            signals: Some(value.signals.iter().map(SignalDef::from).collect()),
        }
    }
}

/// Only present format entries are carried over; the rest have no JSON form.
impl From<&Signal> for SignalDef {
    fn from(value: &Signal) -> Self {
        SignalDef {
            id: value.id.clone(),
            path: value.path.clone(),
            fmt: value.format.as_ref().map(|format| {
                format
                    .present()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect()
            }),
            name: value.name.clone(),
            suggested_metric: value.suggested_metric.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_minimal() {
        let doc = parse(r#"{"commands": []}"#).unwrap();
        assert!(doc.commands.is_empty());
    }

    #[test]
    fn test_parse_keeps_property_order() {
        let doc = parse(
            r#"{"commands":[{"hdr":"7E0","rax":"7E8","cmd":{"22":"F40C"},"freq":0.5,"signals":[]}]}"#,
        )
        .unwrap();

        let keys: Vec<&str> = doc.commands[0]
            .properties()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["hdr", "rax", "cmd", "freq"]);
        assert_eq!(doc.commands[0].receive_address(), Some("7E8"));
    }

    #[test]
    fn test_parse_signal_fields() {
        let doc = parse(
            r#"{"commands":[{"hdr":"7E0","signals":[
                {"id":"SPD","path":"Trips","fmt":{"len":8,"max":255,"unit":"kmph","min":null},
                 "name":"Speed","suggestedMetric":"speed","description":"ignored"}
            ]}]}"#,
        )
        .unwrap();

        let signal = &doc.commands[0].signals[0];
        assert_eq!(signal.id.as_deref(), Some("SPD"));
        assert_eq!(signal.path.as_deref(), Some("Trips"));
        assert_eq!(signal.name.as_deref(), Some("Speed"));
        assert_eq!(signal.suggested_metric.as_deref(), Some("speed"));

        let format = signal.format.as_ref().unwrap();
        let keys: Vec<&str> = format.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["len", "max", "unit", "min"]);
        assert_eq!(format.get("min"), Some(&FormatValue::Absent));
        assert_eq!(format.bit_length(), 8);
    }

    #[test]
    fn test_parse_missing_and_null_signals() {
        let doc = parse(r#"{"commands":[{"hdr":"7E0"},{"hdr":"7E1","signals":null}]}"#).unwrap();
        assert!(doc.commands[0].signals.is_empty());
        assert!(doc.commands[1].signals.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_commands() {
        let err = parse(r#"{"foo": 1}"#).unwrap_err();
        assert_eq!(err, StructuralError::MissingCommands);
        assert!(err.to_string().contains("missing or invalid commands array"));

        assert_eq!(
            parse(r#"{"commands": {}}"#).unwrap_err(),
            StructuralError::MissingCommands
        );
        assert_eq!(parse("[]").unwrap_err(), StructuralError::MissingCommands);
        assert_eq!(parse("null").unwrap_err(), StructuralError::MissingCommands);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse("not json").unwrap_err();
        assert!(matches!(err, StructuralError::Syntax(_)));
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn test_parse_rejects_malformed_command() {
        let err = parse(r#"{"commands":[{"hdr":"7E0"}, "oops"]}"#).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidCommand { index: 1, .. }));

        let err = parse(r#"{"commands":[{"signals":{"id":"A"}}]}"#).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidCommand { index: 0, .. }));

        let err = parse(r#"{"commands":[{"signals":[{"id":5}]}]}"#).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidCommand { index: 0, .. }));
    }

    #[test]
    fn test_parse_rejects_negative_bit_fields() {
        let err = parse(
            r#"{"commands":[{"signals":[{"id":"A","fmt":{"len":8}},{"id":"B","fmt":{"bix":-8,"len":8}}]}]}"#,
        )
        .unwrap_err();

        assert_eq!(
            err,
            StructuralError::InvalidBitField {
                command: 0,
                signal: 1,
                source: BitFieldError::NotAnInteger {
                    key: "bix".to_string(),
                    value: "-8".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_parse_rejects_bit_fields_past_max_bit() {
        let err = parse(
            r#"{"commands":[{"hdr":"7E0","signals":[{"id":"A","fmt":{"bix":9007199254740000,"len":8},"name":"a"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StructuralError::InvalidBitField {
                command: 0,
                signal: 0,
                source: BitFieldError::OutOfRange { .. },
            }
        ));

        let err = parse(r#"{"commands":[{"signals":[{"id":"A","fmt":{"len":524288,"bix":1}}]}]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            StructuralError::InvalidBitField {
                source: BitFieldError::OutOfRange { end: 524289, .. },
                ..
            }
        ));

        let doc = parse(r#"{"commands":[{"signals":[{"id":"A","fmt":{"bix":524280,"len":8}}]}]}"#)
            .unwrap();
        assert_eq!(doc.commands[0].signals[0].bit_end(), Some(crate::signal::MAX_BIT));
    }

    #[test]
    fn test_def_from_document_skips_unset_format_entries() {
        let mut format = Format::bits(0, 8).unwrap();
        format.insert("max", f64::NAN).unwrap();
        let doc = SignalSet::new(vec![Command::from_properties(
            json!({"hdr": "7E0"}).as_object().cloned().unwrap(),
            vec![Signal::new("A", "a").with_format(format)],
        )
        .unwrap()]);

        let def = SignalSetDef::from(&doc);
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            json!({"commands": [{"hdr": "7E0", "signals": [
                {"id": "A", "fmt": {"bix": 0, "len": 8}, "name": "a"}
            ]}]})
        );
    }
}
