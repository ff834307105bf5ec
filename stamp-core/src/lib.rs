//! stamp-core: the serialization contract shared by history and gallery.
//!
//! Design rules:
//! - The scene belongs to the graphics engine; we only ever see its `Document`.
//! - Documents are opaque. Bytes in, bytes out, never rewritten in transit.
//! - Snapshots are immutable and cheap to clone.
//! - Durable storage is a plain string key-value store.

pub mod document;
pub mod engine;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use document::{Document, Snapshot};
pub use engine::{EngineError, ImageBytes, ImageFormat, RenderOptions, SceneEngine};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
