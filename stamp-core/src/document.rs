//! Portable scene documents and the snapshots taken of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The engine's portable serialized form of a scene.
///
/// The core treats the contents as an opaque blob: nothing here parses or
/// normalizes it, so a document always reaches the engine exactly as the
/// engine produced it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(String);

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

// Scene documents can be large; keep debug output short.
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("len", &self.0.len()).finish()
    }
}

/// An immutable document captured at one instant.
///
/// `sequence` is assigned by whoever takes the snapshot and only orders
/// snapshots relative to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    sequence: u64,
    document: Arc<Document>,
}

impl Snapshot {
    pub fn new(sequence: u64, document: Document) -> Self {
        Self {
            sequence,
            document: Arc::new(document),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}
