//! Keeps a signalset's text and structured form in sync while it is edited.

use std::sync::Arc;

use crate::{
    canonical::{CanonicalConfig, serialize_with},
    document::SignalSet,
    errors::{EditError, StructuralError},
    layout::{ByteMap, resolve_byte_map},
    serde::parse,
};

/// An editing session over one signalset.
///
/// Text edits always keep the text exactly as typed; the document snapshot is
/// only replaced when the text parses. Structural edits go the other way: they
/// produce a new snapshot and regenerate the text in canonical form.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    text: String,
    document: Arc<SignalSet>,
    error: Option<StructuralError>,
    config: CanonicalConfig,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CanonicalConfig) -> Self {
        EditSession {
            config,
            ..Default::default()
        }
    }

    /// Starts a session from text. The text is kept even when it does not parse.
    pub fn from_text(text: impl Into<String>, config: CanonicalConfig) -> Self {
        let mut session = Self::with_config(config);
        // A parse failure is recorded in `error`.
        let _ = session.set_text(text);
        session
    }

    /// Replaces the text. On success the document follows; on failure the last
    /// good document stays and the error is kept until the next successful parse.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), StructuralError> {
        self.text = text.into();

        match parse(&self.text) {
            Ok(doc) => {
                self.document = Arc::new(doc);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("keeping last parsed signalset: {}", e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Runs a structural edit against the current snapshot.
    ///
    /// On success the new snapshot is published and the text is regenerated.
    /// On failure nothing changes.
    pub fn apply<F>(&mut self, edit: F) -> Result<(), EditError>
    where
        F: FnOnce(&SignalSet) -> Result<SignalSet, EditError>,
    {
        let next = edit(self.document.as_ref())?;
        self.text = serialize_with(&next, &self.config);
        self.document = Arc::new(next);
        self.error = None;

        log::debug!(
            "applied edit: {} commands, {} signals",
            self.document.commands.len(),
            self.document.signal_count()
        );

        Ok(())
    }

    /// Regenerates the text from the current snapshot, discarding any unparsed edits.
    pub fn canonicalize(&mut self) {
        self.text = serialize_with(&self.document, &self.config);
        self.error = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current snapshot. Earlier snapshots remain valid after further edits.
    pub fn document(&self) -> Arc<SignalSet> {
        Arc::clone(&self.document)
    }

    /// Error from the most recent text edit, if it did not parse.
    pub fn error(&self) -> Option<&StructuralError> {
        self.error.as_ref()
    }

    pub fn config(&self) -> &CanonicalConfig {
        &self.config
    }

    pub fn byte_map(&self, command: usize) -> Result<ByteMap<'_>, EditError> {
        let command = self.document.command(command)?;
        Ok(resolve_byte_map(&command.signals))
    }
}
