//! In-memory engine and storage doubles with failure injection.
//!
//! Enabled by the `testing` feature; used by every crate's test suite.

use serde_json::{json, Value};

use crate::{
    Document, EngineError, ImageBytes, KeyValueStore, MemoryStore, RenderOptions, SceneEngine,
    StorageError,
};

/// A scene of loosely typed objects that serializes to JSON.
#[derive(Debug, Clone)]
pub struct MockCanvas {
    pub background: String,
    pub objects: Vec<Value>,
    pub fail_serialize: bool,
    pub fail_load: bool,
    pub fail_render: bool,
    /// Number of successful `load_scene` calls.
    pub loads: usize,
}

impl Default for MockCanvas {
    fn default() -> Self {
        Self {
            background: "#ffffff".into(),
            objects: Vec::new(),
            fail_serialize: false,
            fail_load: false,
            fail_render: false,
            loads: 0,
        }
    }
}

impl MockCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text object; returns the new object count.
    pub fn add_text(&mut self, text: &str) -> usize {
        self.objects.push(json!({ "type": "i-text", "text": text }));
        self.objects.len()
    }

    pub fn add_circle(&mut self, radius: f64) -> usize {
        self.objects
            .push(json!({ "type": "circle", "radius": radius, "fill": "transparent" }));
        self.objects.len()
    }

    pub fn remove_last(&mut self) -> Option<Value> {
        self.objects.pop()
    }

    /// Text of every text object, in order.
    pub fn texts(&self) -> Vec<String> {
        self.objects
            .iter()
            .filter_map(|o| o.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

impl SceneEngine for MockCanvas {
    fn serialize_scene(&self) -> Result<Document, EngineError> {
        if self.fail_serialize {
            return Err(EngineError::Serialize {
                reason: "injected serialize failure".into(),
            });
        }
        let doc = json!({
            "version": "mock-1",
            "background": self.background,
            "objects": self.objects,
        });
        Ok(Document::new(doc.to_string()))
    }

    fn load_scene(&mut self, doc: &Document) -> Result<(), EngineError> {
        if self.fail_load {
            return Err(EngineError::Load {
                reason: "injected load failure".into(),
            });
        }
        let value: Value = serde_json::from_str(doc.as_str()).map_err(|e| EngineError::Load {
            reason: e.to_string(),
        })?;
        let objects = value
            .get("objects")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| EngineError::Load {
                reason: "document has no objects array".into(),
            })?;
        let background = value
            .get("background")
            .and_then(Value::as_str)
            .unwrap_or("#ffffff")
            .to_string();

        self.objects = objects;
        self.background = background;
        self.loads += 1;
        Ok(())
    }

    fn render_to_image(&self, options: &RenderOptions) -> Result<ImageBytes, EngineError> {
        if self.fail_render {
            return Err(EngineError::Render {
                reason: "injected render failure".into(),
            });
        }
        options.validate()?;
        let body = format!(
            "{}@{}x:{} objects",
            options.format.extension(),
            options.scale_multiplier,
            self.objects.len()
        );
        Ok(ImageBytes::new(options.format, body.into_bytes()))
    }
}

/// Storage whose reads and writes can be switched off.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
    /// Number of successful writes.
    pub writes: usize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable {
                reason: "injected read failure".into(),
            });
        }
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable {
                reason: "quota exceeded".into(),
            });
        }
        self.inner.set(key, value)?;
        self.writes += 1;
        Ok(())
    }
}
