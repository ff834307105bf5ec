//! The design gallery: save, list, load and delete named designs.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stamp_core::{Document, KeyValueStore, SceneEngine};
use stamp_exchange::ImportedDesign;

use crate::{GalleryConfig, GalleryError, Persisted, SavedDesign, COLLECTION_SCHEMA_VERSION};

/// Persisted layout, borrowed for writing.
#[derive(Serialize)]
struct CollectionOut<'a> {
    version: u32,
    designs: &'a [SavedDesign],
}

#[derive(Deserialize)]
struct CollectionIn {
    version: u32,
    designs: Vec<SavedDesign>,
}

/// Either the versioned envelope or the bare array older builds wrote.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection {
    Versioned(CollectionIn),
    Legacy(Vec<SavedDesign>),
}

/// Saved designs backed by a key-value store.
///
/// The collection is read on first use and cached; every mutation writes the
/// whole list back under `config.collection_key`.
pub struct GalleryStore<S: KeyValueStore> {
    storage: S,
    config: GalleryConfig,
    designs: Option<Vec<SavedDesign>>,
    dirty: bool,
}

impl<S: KeyValueStore> GalleryStore<S> {
    pub fn new(storage: S, config: GalleryConfig) -> Result<Self, GalleryError> {
        config.validate()?;
        Ok(Self {
            storage,
            config,
            designs: None,
            dirty: false,
        })
    }

    pub fn with_defaults(storage: S) -> Self {
        Self {
            storage,
            config: GalleryConfig::default(),
            designs: None,
            dirty: false,
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// True when the in-memory list has changes the last write did not persist.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// All saved designs in save order.
    pub fn list_saved(&mut self) -> Result<&[SavedDesign], GalleryError> {
        Ok(self.designs()?.as_slice())
    }

    pub fn len(&mut self) -> Result<usize, GalleryError> {
        Ok(self.designs()?.len())
    }

    pub fn get(&mut self, id: &str) -> Result<Option<&SavedDesign>, GalleryError> {
        Ok(self.designs()?.iter().find(|d| d.id == id))
    }

    /// Save the engine's current scene under `name`.
    pub fn save<E: SceneEngine + ?Sized>(
        &mut self,
        engine: &E,
        name: &str,
        description: &str,
    ) -> Result<Persisted<SavedDesign>, GalleryError> {
        let name = name.trim();
        if name.is_empty() {
            tracing::error!("design name cannot be empty");
            return Err(GalleryError::EmptyName);
        }

        // Everything fallible happens before the list is touched.
        let existing = self.designs()?;
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !existing.iter().any(|d| d.id == candidate) {
                break candidate;
            }
        };

        let data = engine.serialize_scene()?;
        let preview = engine.render_to_image(&self.config.preview)?.to_data_uri();

        let design = SavedDesign {
            id,
            name: name.to_string(),
            description: description.trim().to_string(),
            data,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            preview,
        };

        self.designs()?.push(design.clone());

        tracing::info!(
            id = %design.id,
            name = %design.name,
            bytes = design.data.len(),
            "saved design"
        );

        let sync_error = self.persist().err();
        Ok(Persisted::new(design, sync_error))
    }

    /// Remove the design with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<Persisted<bool>, GalleryError> {
        let designs = self.designs()?;
        let before = designs.len();
        designs.retain(|d| d.id != id);
        let removed = designs.len() != before;

        if !removed {
            tracing::debug!(id = %id, "delete of unknown design ignored");
            if !self.dirty {
                return Ok(Persisted::new(false, None));
            }
        } else {
            tracing::info!(id = %id, "deleted design");
        }

        let sync_error = self.persist().err();
        Ok(Persisted::new(removed, sync_error))
    }

    /// The stored document for `id`, ready to hand to the engine.
    pub fn load(&mut self, id: &str) -> Result<Document, GalleryError> {
        let doc = self
            .designs()?
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.data.clone())
            .ok_or_else(|| {
                tracing::warn!(id = %id, "load of unknown design");
                GalleryError::NotFound { id: id.to_string() }
            })?;

        tracing::debug!(id = %id, bytes = doc.len(), "loaded design");
        Ok(doc)
    }

    /// Parse an external file. The gallery itself is not touched.
    pub fn import_from_external_file(&self, bytes: &[u8]) -> Result<ImportedDesign, GalleryError> {
        let design = stamp_exchange::parse_external(bytes)?;
        tracing::info!(
            name = ?design.name,
            bytes = design.document.len(),
            "parsed external design file"
        );
        Ok(design)
    }

    /// Retry a write that failed earlier.
    pub fn flush(&mut self) -> Result<(), GalleryError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()
    }

    fn designs(&mut self) -> Result<&mut Vec<SavedDesign>, GalleryError> {
        if self.designs.is_none() {
            let loaded = self.read_collection()?;
            tracing::debug!(
                key = %self.config.collection_key,
                count = loaded.len(),
                "gallery collection loaded"
            );
            self.designs = Some(loaded);
        }
        Ok(self.designs.get_or_insert_with(Vec::new))
    }

    fn read_collection(&self) -> Result<Vec<SavedDesign>, GalleryError> {
        let key = &self.config.collection_key;
        let Some(text) = self.storage.get(key)? else {
            return Ok(Vec::new());
        };

        let stored: StoredCollection = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(key = %key, error = %e, "stored gallery collection is corrupt");
            GalleryError::CorruptCollection {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;

        match stored {
            StoredCollection::Versioned(c) if c.version > COLLECTION_SCHEMA_VERSION => {
                tracing::error!(found = c.version, "gallery collection from a newer build");
                Err(GalleryError::UnsupportedCollectionVersion {
                    found: c.version,
                    supported: COLLECTION_SCHEMA_VERSION,
                })
            }
            StoredCollection::Versioned(c) => Ok(c.designs),
            StoredCollection::Legacy(designs) => {
                tracing::info!(
                    count = designs.len(),
                    "read unversioned gallery collection; next write migrates it"
                );
                Ok(designs)
            }
        }
    }

    fn persist(&mut self) -> Result<(), GalleryError> {
        let designs = self.designs.as_deref().unwrap_or(&[]);
        let json = serde_json::to_string(&CollectionOut {
            version: COLLECTION_SCHEMA_VERSION,
            designs,
        })?;

        match self.storage.set(&self.config.collection_key, &json) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.config.collection_key,
                    error = %e,
                    "gallery write failed; changes kept in memory only"
                );
                self.dirty = true;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stamp_core::testing::{FlakyStore, MockCanvas};
    use stamp_core::MemoryStore;

    fn canvas_with(text: &str) -> MockCanvas {
        let mut canvas = MockCanvas::new();
        canvas.add_circle(125.0);
        canvas.add_text(text);
        canvas
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        let canvas = canvas_with("x");

        for name in ["", "   ", "\t\n"] {
            assert!(matches!(
                gallery.save(&canvas, name, "desc"),
                Err(GalleryError::EmptyName)
            ));
        }
        assert_eq!(gallery.len().unwrap(), 0);
        assert!(gallery.storage().is_empty());
    }

    #[test]
    fn test_save_captures_scene_and_preview() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        let canvas = canvas_with("APPROVED");

        let saved = gallery
            .save(&canvas, "  Approved Stamp ", "desc")
            .unwrap()
            .into_inner();

        assert_eq!(saved.name, "Approved Stamp");
        assert_eq!(saved.data, canvas.serialize_scene().unwrap());
        assert!(saved.preview.starts_with("data:image/png;base64,"));
        assert!(chrono::DateTime::parse_from_rfc3339(&saved.created_at).is_ok());
        assert_eq!(gallery.load(&saved.id).unwrap(), saved.data);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        let canvas = canvas_with("x");
        let a = gallery.save(&canvas, "a", "").unwrap().into_inner();
        let b = gallery.save(&canvas, "a", "").unwrap().into_inner();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_delete_then_load_not_found() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        let saved = gallery
            .save(&canvas_with("x"), "Approved Stamp", "desc")
            .unwrap()
            .into_inner();

        assert!(gallery.delete(&saved.id).unwrap().into_inner());
        assert!(!gallery.delete(&saved.id).unwrap().into_inner());
        assert!(matches!(
            gallery.load(&saved.id),
            Err(GalleryError::NotFound { .. })
        ));
        assert!(gallery.list_saved().unwrap().is_empty());
    }

    #[test]
    fn test_engine_failure_leaves_store_unchanged() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        let mut canvas = canvas_with("x");

        canvas.fail_serialize = true;
        assert!(matches!(
            gallery.save(&canvas, "a", ""),
            Err(GalleryError::Engine(_))
        ));

        canvas.fail_serialize = false;
        canvas.fail_render = true;
        assert!(gallery.save(&canvas, "a", "").is_err());

        assert_eq!(gallery.len().unwrap(), 0);
        assert!(gallery.storage().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_memory_and_flush_retries() {
        let mut store = FlakyStore::new();
        store.fail_writes = true;
        let mut gallery = GalleryStore::with_defaults(store);

        let result = gallery.save(&canvas_with("x"), "offline", "").unwrap();
        assert!(!result.is_synced());
        assert!(gallery.is_dirty());
        assert_eq!(gallery.len().unwrap(), 1);

        let mut store = gallery.into_storage();
        store.fail_writes = false;
        // A fresh store sees nothing: the write never happened.
        let mut reopened = GalleryStore::with_defaults(store.clone());
        assert_eq!(reopened.len().unwrap(), 0);

        let mut gallery = GalleryStore::with_defaults(store);
        let _ = gallery.save(&canvas_with("y"), "online", "").unwrap();
        assert!(!gallery.is_dirty());
        gallery.flush().unwrap();
    }

    #[test]
    fn test_flush_persists_pending_changes() {
        let mut gallery = GalleryStore::with_defaults(FlakyStore::new());
        gallery.storage.fail_writes = true;
        let _ = gallery.save(&canvas_with("x"), "pending", "").unwrap();
        assert!(gallery.flush().is_err());

        gallery.storage.fail_writes = false;
        gallery.flush().unwrap();
        assert!(!gallery.is_dirty());

        let mut reopened = GalleryStore::with_defaults(gallery.into_storage());
        assert_eq!(reopened.list_saved().unwrap()[0].name, "pending");
    }

    #[test]
    fn test_delete_write_failure_keeps_removal_until_flush() {
        let mut gallery = GalleryStore::with_defaults(FlakyStore::new());
        let keep = gallery.save(&canvas_with("k"), "keep", "").unwrap().into_inner();
        let gone = gallery.save(&canvas_with("g"), "gone", "").unwrap().into_inner();

        gallery.storage.fail_writes = true;
        let removed = gallery.delete(&gone.id).unwrap();
        assert!(!removed.is_synced());
        assert!(removed.into_inner());
        assert!(gallery.is_dirty());
        assert!(gallery.get(&gone.id).unwrap().is_none());
        assert!(matches!(
            gallery.load(&gone.id),
            Err(GalleryError::NotFound { .. })
        ));

        gallery.storage.fail_writes = false;
        gallery.flush().unwrap();
        assert!(!gallery.is_dirty());

        let mut reopened = GalleryStore::with_defaults(gallery.into_storage());
        let ids: Vec<_> = reopened
            .list_saved()
            .unwrap()
            .iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[test]
    fn test_delete_of_unknown_id_while_dirty_still_writes() {
        let mut gallery = GalleryStore::with_defaults(FlakyStore::new());
        let gone = gallery.save(&canvas_with("g"), "gone", "").unwrap().into_inner();

        gallery.storage.fail_writes = true;
        let _ = gallery.delete(&gone.id).unwrap();
        assert!(gallery.is_dirty());

        gallery.storage.fail_writes = false;
        let writes = gallery.storage.writes;
        let retried = gallery.delete("no-such-id").unwrap();
        assert!(retried.is_synced());
        assert!(!retried.into_inner());
        assert!(!gallery.is_dirty());
        assert_eq!(gallery.storage.writes, writes + 1);

        let mut reopened = GalleryStore::with_defaults(gallery.into_storage());
        assert!(reopened.list_saved().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_id_delete_skips_write_when_clean() {
        let mut gallery = GalleryStore::with_defaults(FlakyStore::new());
        let _ = gallery.save(&canvas_with("x"), "x", "").unwrap();
        let writes = gallery.storage.writes;

        assert!(!gallery.delete("no-such-id").unwrap().into_inner());
        assert_eq!(gallery.storage.writes, writes);
    }

    #[test]
    fn test_read_failure_surfaces_and_retries() {
        let mut store = FlakyStore::new();
        store.fail_reads = true;
        let mut gallery = GalleryStore::with_defaults(store);
        assert!(matches!(gallery.list_saved(), Err(GalleryError::Storage(_))));

        gallery.storage.fail_reads = false;
        assert!(gallery.list_saved().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_collection_is_not_overwritten() {
        let mut store = MemoryStore::new();
        store.set("savedStamps", "{definitely not json").unwrap();
        let mut gallery = GalleryStore::with_defaults(store);

        assert!(matches!(
            gallery.save(&canvas_with("x"), "a", ""),
            Err(GalleryError::CorruptCollection { .. })
        ));
        assert_eq!(
            gallery.storage().get("savedStamps").unwrap().as_deref(),
            Some("{definitely not json")
        );
    }

    #[test]
    fn test_legacy_array_is_read_and_migrated() {
        let legacy = r#"[{"id":"1718000000000","name":"Old","description":"","data":"","createdAt":"6/10/2024","preview":"data:image/png;base64,"}]"#;
        let mut store = MemoryStore::new();
        store.set("savedStamps", legacy).unwrap();
        let mut gallery = GalleryStore::with_defaults(store);

        assert_eq!(gallery.list_saved().unwrap()[0].created_at, "6/10/2024");
        let _ = gallery.save(&canvas_with("x"), "New", "").unwrap();

        let raw = gallery.storage().get("savedStamps").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["designs"].as_array().unwrap().len(), 2);
        assert_eq!(value["designs"][0]["id"], "1718000000000");
    }

    #[test]
    fn test_newer_collection_version_rejected() {
        let mut store = MemoryStore::new();
        store
            .set("savedStamps", r#"{"version":9,"designs":[]}"#)
            .unwrap();
        let mut gallery = GalleryStore::with_defaults(store);
        assert!(matches!(
            gallery.list_saved(),
            Err(GalleryError::UnsupportedCollectionVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_import_does_not_touch_gallery() {
        let mut gallery = GalleryStore::with_defaults(MemoryStore::new());
        assert!(gallery.import_from_external_file(b"{broken").is_err());

        let imported = gallery
            .import_from_external_file(br#"{"objects":[]}"#)
            .unwrap();
        assert_eq!(imported.document.as_str(), r#"{"objects":[]}"#);
        assert_eq!(gallery.len().unwrap(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GalleryConfig {
            collection_key: " ".into(),
            ..Default::default()
        };
        assert!(GalleryStore::new(MemoryStore::new(), config).is_err());
    }
}
