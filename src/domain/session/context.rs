//! Session context - the open key/value mapping carried by each session.
//!
//! Reserved key families:
//! - `document_<sanitizedName>` : one [`DocumentContext`] per upload
//! - `<service>_workflow_state` : scalar workflow position
//! - `<service>_<param>`        : service-scoped scratch values
//! - `timeout_awaiting_choice`  : inactivity choice pending
//! - `redirect_to_end_connection` : next turn offers session end

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::document::DocumentContext;
use crate::domain::workflow::ServiceKind;

/// Flag set while the engine waits for the user's timeout choice.
pub const TIMEOUT_AWAITING_CHOICE: &str = "timeout_awaiting_choice";

/// Flag set when the next turn should offer ending the session.
pub const REDIRECT_TO_END_CONNECTION: &str = "redirect_to_end_connection";

/// Prefix of per-document context keys.
pub const DOCUMENT_KEY_PREFIX: &str = "document_";

/// Open mapping from string keys to arbitrary structured values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext(BTreeMap<String, Value>);

impl SessionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets a raw value, returning any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Removes a key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// True if the key holds boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Bool(true)))
    }

    /// String value lookup.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Direct access to the underlying map (for persistence adapters).
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Mutable access for the schema upgrade step.
    pub fn as_map_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.0
    }

    // ── Documents ──────────────────────────────────────────────────

    /// Context key for an attachment name.
    pub fn document_key(file_name: &str) -> String {
        let sanitized: String = file_name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{DOCUMENT_KEY_PREFIX}{sanitized}")
    }

    /// Stores a document entry under its reserved key.
    pub fn put_document(&mut self, key: impl Into<String>, entry: &DocumentContext) {
        // DocumentContext serialization is infallible (plain maps/strings).
        let value = serde_json::to_value(entry).unwrap_or(Value::Null);
        self.0.insert(key.into(), value);
    }

    /// All stored document entries, keyed by context key.
    ///
    /// Entries that fail to deserialize are skipped; a malformed entry
    /// must not take the whole session down.
    pub fn documents(&self) -> Vec<(String, DocumentContext)> {
        self.0
            .iter()
            .filter(|(k, _)| k.starts_with(DOCUMENT_KEY_PREFIX))
            .filter_map(|(k, v)| {
                serde_json::from_value::<DocumentContext>(v.clone())
                    .ok()
                    .map(|doc| (k.clone(), doc))
            })
            .collect()
    }

    /// The oldest document still awaiting verification, if any.
    ///
    /// The engine resolves the oldest pending entry before considering
    /// newer uploads, which keeps at most one entry actively pending.
    pub fn pending_document(&self) -> Option<(String, DocumentContext)> {
        self.documents()
            .into_iter()
            .filter(|(_, doc)| doc.is_verified.is_pending())
            .min_by_key(|(_, doc)| doc.uploaded_at)
    }

    /// All verified document entries.
    pub fn verified_documents(&self) -> Vec<DocumentContext> {
        self.documents()
            .into_iter()
            .filter(|(_, doc)| !doc.is_verified.is_pending())
            .map(|(_, doc)| doc)
            .collect()
    }

    // ── Service workflow ───────────────────────────────────────────

    /// Current workflow state string for a service.
    pub fn workflow_state(&self, service: ServiceKind) -> Option<&str> {
        self.get_str(&service.workflow_state_key())
    }

    /// Service-scoped scratch value.
    pub fn service_param(&self, service: ServiceKind, param: &str) -> Option<&Value> {
        self.0.get(&service.param_key(param))
    }
}
