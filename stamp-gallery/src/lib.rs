//! stamp-gallery: durable, named stamp designs for the studio.
//!
//! Design rules:
//! - The gallery is independent of undo history. Saving is a deliberate checkpoint.
//! - Saved designs are never edited in place; saving again creates a new entry.
//! - The whole collection is read once, cached, and written back whole.
//! - In-memory state is the source of truth for the session, even if a write fails.

use serde::{Deserialize, Serialize};
use stamp_core::{Document, EngineError, RenderOptions, StorageError};
use thiserror::Error;

/// Version tag of the persisted collection layout.
pub const COLLECTION_SCHEMA_VERSION: u32 = 1;

/// Storage key the collection lives under.
pub const DEFAULT_COLLECTION_KEY: &str = "savedStamps";

/// A named, user-persisted stamp design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDesign {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The full scene document.
    pub data: Document,
    /// RFC 3339 for designs saved here; older entries carry whatever
    /// date string they were written with.
    pub created_at: String,
    /// `data:` URI of the thumbnail.
    pub preview: String,
}

impl SavedDesign {
    /// Envelope for writing this design to an external file.
    pub fn to_design_file(&self) -> stamp_exchange::DesignFileV1 {
        stamp_exchange::DesignFileV1::new(&self.name, &self.description, &self.data)
    }
}

/// Gallery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub collection_key: String,
    /// How thumbnails are rendered.
    pub preview: RenderOptions,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            preview: RenderOptions::thumbnail(),
        }
    }
}

impl GalleryConfig {
    pub fn validate(&self) -> Result<(), GalleryError> {
        if self.collection_key.trim().is_empty() {
            tracing::error!("gallery collection key cannot be empty");
            return Err(GalleryError::InvalidConfig {
                reason: "collection_key must not be empty".into(),
            });
        }

        self.preview
            .validate()
            .map_err(|e| GalleryError::InvalidConfig {
                reason: format!("preview: {}", e),
            })?;

        Ok(())
    }
}

/// A value produced by an operation whose durable write may have failed.
///
/// The in-memory change always happened. `sync_error` says whether it will
/// survive a reload.
#[must_use]
#[derive(Debug)]
pub struct Persisted<T> {
    pub value: T,
    pub sync_error: Option<GalleryError>,
}

impl<T> Persisted<T> {
    pub fn new(value: T, sync_error: Option<GalleryError>) -> Self {
        Self { value, sync_error }
    }

    pub fn is_synced(&self) -> bool {
        self.sync_error.is_none()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Gallery errors.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("design name cannot be empty")]
    EmptyName,

    #[error("no saved design with id {id}")]
    NotFound { id: String },

    #[error("stored collection under {key:?} is unreadable: {reason}")]
    CorruptCollection { key: String, reason: String },

    #[error("stored collection version {found} is newer than supported {supported}")]
    UnsupportedCollectionVersion { found: u32, supported: u32 },

    #[error("invalid gallery configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("invalid export naming: {reason}")]
    InvalidNaming { reason: String },

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("import failed: {0}")]
    Import(#[from] stamp_exchange::ExchangeError),

    #[error("failed to encode collection: {0}")]
    Encode(#[from] serde_json::Error),
}

pub mod export;
pub mod store;
pub mod templates;

pub use export::{export_scene, ExportArtifact, ExportNaming, ExportPreset};
pub use store::GalleryStore;
pub use templates::{builtin_templates, find_template, StampTemplate, TemplateCategory};

/// Write a saved design to disk as an exchange file.
pub fn export_design_file(
    path: impl AsRef<std::path::Path>,
    design: &SavedDesign,
) -> anyhow::Result<()> {
    use anyhow::Context;

    tracing::info!(id = %design.id, name = %design.name, "exporting design file");
    stamp_exchange::write_design_file(path, &design.to_design_file())
        .with_context(|| format!("export design {}", design.id))
}
