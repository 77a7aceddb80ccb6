//! # signalset
//!
//! Document model, byte-layout resolver and canonical serializer for vehicle
//! signalset files: JSON descriptions of diagnostic commands whose responses
//! carry bit-packed signals.
//!
//! - [parse] turns signalset text into a [SignalSet].
//! - [resolve_byte_map] reports which signals occupy each byte of a command's payload.
//! - [serialize] renders a [SignalSet] back to the canonical, diff-friendly text form.
//! - [edit] and [EditSession] implement copy-on-write editing on top of the three.
//!
//! ## Example
//!
//! ```
//! use signalset::{parse, resolve_byte_map, serialize};
//!
//! let doc = parse(r#"{"commands": [{"hdr": "7E0", "fcm1": false, "signals": [
//!     {"id": "RPM", "fmt": {"bix": 0, "len": 16, "unit": "rpm"}, "name": "Engine RPM"},
//!     {"id": "GEAR", "fmt": {"bix": 12, "len": 4}, "name": "Gear"}
//! ]}]}"#).unwrap();
//!
//! let map = resolve_byte_map(&doc.commands[0].signals);
//! assert_eq!(map.len(), 2);
//! assert!(map.is_shared(1));
//!
//! let text = serialize(&doc);
//! assert!(text.starts_with("{ \"commands\": [\n{ \"hdr\": \"7E0\",\n"));
//! assert_eq!(serialize(&parse(&text).unwrap()), text);
//! ```

pub mod canonical;
pub mod document;
pub mod edit;
pub mod errors;
pub mod keys;
pub mod layout;
pub mod serde;
pub mod session;
pub mod signal;

pub use crate::canonical::{CanonicalConfig, serialize, serialize_with};
pub use crate::document::{Command, SignalSet};
pub use crate::errors::{BitFieldError, EditError, StructuralError};
pub use crate::layout::{ByteMap, resolve_byte_map};
pub use crate::serde::parse;
pub use crate::session::EditSession;
pub use crate::signal::{Format, FormatValue, MAX_BIT, Signal};
