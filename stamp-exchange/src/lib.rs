// This defines the JSON format that we accept from design files
// Parse and validate it
// Convert it to a Document the rest of the workspace can hand to the engine

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

use stamp_core::Document;

/// Marker written in the `format` field of exported design files.
pub const DESIGN_FILE_FORMAT: &str = "stamp-design";

/// Envelope version this crate reads and writes.
pub const DESIGN_FILE_VERSION: u32 = 1;

/// File extension recommended for exported designs.
pub const DESIGN_FILE_EXT: &str = "stamp.json";

/// Exported design envelope (v1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignFileV1 {
    pub format: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The scene document, as a JSON string or inline JSON.
    pub data: Value,
}

impl DesignFileV1 {
    pub fn new(name: impl Into<String>, description: impl Into<String>, doc: &Document) -> Self {
        Self {
            format: DESIGN_FILE_FORMAT.to_string(),
            version: DESIGN_FILE_VERSION,
            name: name.into(),
            description: description.into(),
            data: Value::String(doc.as_str().to_string()),
        }
    }
}

/// What an external file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDesign {
    /// Present when the file was a design envelope.
    pub name: Option<String>,
    pub description: String,
    pub document: Document,
}

/// Parse an externally supplied design file.
///
/// Accepts either a design envelope or any other well-formed JSON value,
/// which is taken verbatim as a raw engine document.
pub fn parse_external(bytes: &[u8]) -> Result<ImportedDesign, ExchangeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        tracing::error!(valid_up_to = e.valid_up_to(), "design file is not utf-8");
        ExchangeError::NotUtf8 {
            valid_up_to: e.valid_up_to(),
        }
    })?;

    if text.trim().is_empty() {
        tracing::error!("design file is empty");
        return Err(ExchangeError::Empty);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| {
        tracing::error!(line = e.line(), column = e.column(), "design file is not valid json");
        ExchangeError::Malformed {
            line: e.line(),
            column: e.column(),
            reason: e.to_string(),
        }
    })?;

    if !is_envelope(&value) {
        tracing::debug!(bytes = text.len(), "importing raw scene document");
        return Ok(ImportedDesign {
            name: None,
            description: String::new(),
            document: Document::new(text),
        });
    }

    let version = value.get("version").and_then(Value::as_u64);
    if version != Some(u64::from(DESIGN_FILE_VERSION)) {
        tracing::error!(version = ?version, "unsupported design file version");
        return Err(ExchangeError::UnsupportedVersion {
            found: value.get("version").map(Value::to_string),
        });
    }

    let file: DesignFileV1 =
        serde_json::from_value(value).map_err(|e| ExchangeError::InvalidEnvelope {
            reason: e.to_string(),
        })?;

    let document = match file.data {
        Value::String(s) => Document::new(s),
        Value::Null => {
            return Err(ExchangeError::InvalidEnvelope {
                reason: "data is null".into(),
            })
        }
        inline => Document::new(inline.to_string()),
    };

    tracing::debug!(name = %file.name, bytes = document.len(), "imported design envelope");

    Ok(ImportedDesign {
        name: Some(file.name),
        description: file.description,
        document,
    })
}

fn is_envelope(value: &Value) -> bool {
    value
        .get("format")
        .and_then(Value::as_str)
        .is_some_and(|f| f == DESIGN_FILE_FORMAT)
}

/// Write a design envelope to disk as pretty JSON.
pub fn write_design_file(path: impl AsRef<Path>, file: &DesignFileV1) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(file).context("serialize design to json")?;
    fs::write(path, json).with_context(|| format!("write design file: {}", path.display()))?;
    Ok(())
}

/// Read and parse a design file from disk.
pub fn read_design_file(path: impl AsRef<Path>) -> anyhow::Result<ImportedDesign> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("read design file: {}", path.display()))?;
    let design = parse_external(&bytes)
        .with_context(|| format!("parse design file: {}", path.display()))?;
    Ok(design)
}

/// Reasons an external file is rejected.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("design file is not valid utf-8 (valid up to byte {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },

    #[error("design file is empty")]
    Empty,

    #[error("design file is not valid json at {line}:{column}: {reason}")]
    Malformed {
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("unsupported design file version: {found:?}")]
    UnsupportedVersion { found: Option<String> },

    #[error("invalid design envelope: {reason}")]
    InvalidEnvelope { reason: String },
}
