//! The seam between the core and the external graphics engine.
//!
//! The engine owns the live scene. We ask it for documents, hand documents
//! back, and ask it to render; everything else is its business.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Document;

/// Output encodings an engine can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Svg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Svg => "svg",
        }
    }

    /// Vector output ignores quality and multiplier.
    pub fn is_raster(&self) -> bool {
        !matches!(self, ImageFormat::Svg)
    }
}

/// Parameters for `SceneEngine::render_to_image`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub format: ImageFormat,
    /// Encoder quality in [0.0, 1.0].
    pub quality: f32,
    /// Output scale relative to the canvas size.
    #[serde(rename = "multiplier")]
    pub scale_multiplier: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::full_quality(ImageFormat::Png, 1.0)
    }
}

impl RenderOptions {
    pub fn full_quality(format: ImageFormat, scale_multiplier: f32) -> Self {
        Self {
            format,
            quality: 1.0,
            scale_multiplier,
        }
    }

    /// Reduced-quality raster used for gallery thumbnails.
    pub fn thumbnail() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 0.3,
            scale_multiplier: 0.5,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.quality) {
            tracing::error!(quality = self.quality, "render quality out of range");
            return Err(EngineError::InvalidRenderOptions {
                reason: format!("quality {} must be in [0.0, 1.0]", self.quality),
            });
        }

        if !self.scale_multiplier.is_finite() || self.scale_multiplier <= 0.0 {
            tracing::error!(
                multiplier = self.scale_multiplier,
                "render multiplier must be positive"
            );
            return Err(EngineError::InvalidRenderOptions {
                reason: format!(
                    "multiplier {} must be a positive finite number",
                    self.scale_multiplier
                ),
            });
        }

        if self.scale_multiplier > 8.0 {
            tracing::warn!(
                multiplier = self.scale_multiplier,
                "unusually large render multiplier (recommended: up to 4)"
            );
        }

        Ok(())
    }
}

/// Encoded image produced by the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImageBytes {
    pub fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// `data:<mime>;base64,<payload>`, the form stored as a design preview.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl std::fmt::Debug for ImageBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBytes")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Capabilities we consume from the graphics engine.
pub trait SceneEngine {
    /// Produce a portable document for the current scene.
    fn serialize_scene(&self) -> Result<Document, EngineError>;

    /// Replace the whole scene with `doc`.
    ///
    /// Implementations must be atomic: on error the live scene is untouched.
    fn load_scene(&mut self, doc: &Document) -> Result<(), EngineError>;

    fn render_to_image(&self, options: &RenderOptions) -> Result<ImageBytes, EngineError>;
}

/// Errors reported by the graphics engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scene serialization failed: {reason}")]
    Serialize { reason: String },

    #[error("document could not be loaded: {reason}")]
    Load { reason: String },

    #[error("rendering failed: {reason}")]
    Render { reason: String },

    #[error("{format:?} output is not supported by this engine")]
    UnsupportedFormat { format: ImageFormat },

    #[error("invalid render options: {reason}")]
    InvalidRenderOptions { reason: String },
}
