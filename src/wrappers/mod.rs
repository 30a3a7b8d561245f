//! Dirty-tracking wrappers over Galaxy JSON documents.
//!
//! A [`Wrapper`] knows exactly the fields present in the document it was
//! built from. Reads and writes of any other key fail with
//! [`GalaxyError::NotFound`]; every successful write marks the wrapper (and
//! whatever owns it) modified.

pub mod entities;
pub mod step;
pub mod taint;
pub mod tool;
pub mod workflow;

use crate::error::{GalaxyError, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use entities::{
    Entity, History, HistoryDataset, InstalledTool, Invocation, Job, Library, LibraryDataset,
    WorkflowPreview,
};
pub use step::{Step, StepType};
pub use taint::Taint;
pub use tool::Tool;
pub use workflow::Workflow;

/// A JSON object as returned by the Galaxy API.
pub type Document = Map<String, Value>;

/// Field access over a document with a fixed set of recognized keys.
#[derive(Debug)]
pub struct Wrapper {
    kind: &'static str,
    original: Arc<Document>,
    working: Document,
    taint: Taint,
}

impl Wrapper {
    /// Wrap `document`; its keys become the recognized field set.
    pub fn new(document: Document) -> Self {
        Self::of_kind("Wrapper", document)
    }

    /// Wrap `document`, forcing its `id` field to `id` when given.
    pub fn with_id(mut document: Document, id: Option<&str>) -> Self {
        if let Some(id) = id {
            document.insert("id".to_string(), Value::String(id.to_string()));
        }
        Self::new(document)
    }

    /// Parse a JSON object and wrap it.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: Document = serde_json::from_str(text)?;
        Ok(Self::new(document))
    }

    pub(crate) fn of_kind(kind: &'static str, document: Document) -> Self {
        Self::with_taint(kind, document, Taint::new())
    }

    pub(crate) fn with_taint(kind: &'static str, document: Document, taint: Taint) -> Self {
        Self {
            kind,
            original: Arc::new(document.clone()),
            working: document,
            taint,
        }
    }

    /// Read the current value of `key`.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.working
            .get(key)
            .ok_or_else(|| GalaxyError::not_found(self.kind, key))
    }

    /// Overwrite `key` and mark the wrapper modified.
    ///
    /// Assigning a value equal to the current one still counts as a
    /// modification.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        match self.working.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                self.taint.mark_modified();
                Ok(())
            }
            None => Err(GalaxyError::not_found(self.kind, key)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.working.contains_key(key)
    }

    /// Recognized field names, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.working.keys().map(String::as_str)
    }

    /// String value of `key`, or `None` when absent or not a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.working.get(key).and_then(Value::as_str)
    }

    /// Boolean value of `key`, `false` when absent or not a boolean.
    pub fn bool_field(&self, key: &str) -> bool {
        self.working
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The object's identity, rendered as a string.
    pub fn id(&self) -> Option<String> {
        match self.working.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Reset identity to unset without tainting.
    pub(crate) fn clear_id(&mut self) {
        if let Some(slot) = self.working.get_mut("id") {
            *slot = Value::Null;
        }
    }

    pub fn is_modified(&self) -> bool {
        self.taint.is_modified()
    }

    pub(crate) fn taint(&self) -> &Taint {
        &self.taint
    }

    /// The document as it was at construction.
    pub fn original(&self) -> &Document {
        &self.original
    }

    /// The current document.
    pub fn document(&self) -> &Document {
        &self.working
    }

    pub fn into_document(self) -> Document {
        self.working
    }

    /// Serialize the current document.
    pub fn to_json(&self) -> String {
        Value::Object(self.working.clone()).to_string()
    }

    /// Independent copy with identity cleared and no mutation history.
    pub fn clone_fresh(&self) -> Self {
        let mut copy = Self::of_kind(self.kind, self.working.clone());
        copy.clear_id();
        copy.original = Arc::new(copy.working.clone());
        copy
    }
}

impl PartialEq for Wrapper {
    fn eq(&self, other: &Self) -> bool {
        self.working == other.working
    }
}

impl Serialize for Wrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.working.serialize(serializer)
    }
}

impl From<Document> for Wrapper {
    fn from(document: Document) -> Self {
        Wrapper::new(document)
    }
}
