//! Export presets for finished stamps.
//!
//! Defines the render settings and file naming used when a stamp leaves the
//! studio as an image. Rendering itself is the engine's job.

use serde::{Deserialize, Serialize};
use stamp_core::{ImageBytes, ImageFormat, RenderOptions, SceneEngine};

use crate::GalleryError;

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPreset {
    Png,      // Screen PNG at 3x
    PrintPng, // Print-resolution PNG at 4x
    Svg,      // Vector
}

impl ExportPreset {
    pub fn all() -> [ExportPreset; 3] {
        [ExportPreset::Png, ExportPreset::PrintPng, ExportPreset::Svg]
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            ExportPreset::Png | ExportPreset::PrintPng => ImageFormat::Png,
            ExportPreset::Svg => ImageFormat::Svg,
        }
    }

    /// Render settings handed to the engine.
    pub fn render_options(&self) -> RenderOptions {
        match self {
            ExportPreset::Png => RenderOptions::full_quality(ImageFormat::Png, 3.0),
            ExportPreset::PrintPng => RenderOptions::full_quality(ImageFormat::Png, 4.0),
            ExportPreset::Svg => RenderOptions::full_quality(ImageFormat::Svg, 1.0),
        }
    }

    fn suffix(&self) -> Option<&'static str> {
        match self {
            ExportPreset::PrintPng => Some("print"),
            ExportPreset::Png | ExportPreset::Svg => None,
        }
    }
}

/// File naming for exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNaming {
    pub stem: String,
    pub separator: String,
    pub lowercase: bool,
}

impl Default for ExportNaming {
    fn default() -> Self {
        Self {
            stem: "professional-stamp".into(),
            separator: "-".into(),
            lowercase: true,
        }
    }
}

impl ExportNaming {
    /// Naming derived from a design's display name.
    pub fn for_design(name: &str) -> Self {
        let stem = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        if stem.is_empty() {
            return Self::default();
        }
        Self {
            stem,
            ..Default::default()
        }
    }

    pub fn filename(&self, preset: ExportPreset) -> String {
        let mut name = match preset.suffix() {
            Some(suffix) => format!("{}{}{}", self.stem, self.separator, suffix),
            None => self.stem.clone(),
        };
        if self.lowercase {
            name = name.to_lowercase();
        }
        format!("{}.{}", name, preset.format().extension())
    }

    /// Checks for characters that are invalid in filenames.
    pub fn validate(&self) -> Result<(), GalleryError> {
        if self.stem.trim().is_empty() {
            tracing::error!("export stem cannot be empty");
            return Err(GalleryError::InvalidNaming {
                reason: "stem must not be empty".into(),
            });
        }

        let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
        for ch in invalid_chars {
            if self.stem.contains(ch) || self.separator.contains(ch) {
                tracing::error!(
                    stem = %self.stem,
                    invalid_char = %ch,
                    "export name contains invalid filename character"
                );
                return Err(GalleryError::InvalidNaming {
                    reason: format!("name contains invalid character '{}'", ch),
                });
            }
        }

        if self.separator.len() > 5 {
            tracing::warn!(
                separator = %self.separator,
                "unusually long separator (recommended: 1-2 chars)"
            );
        }

        Ok(())
    }
}

/// A rendered export, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub image: ImageBytes,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.image.format.mime_type()
    }

    pub fn to_data_uri(&self) -> String {
        self.image.to_data_uri()
    }
}

/// Render the engine's current scene with `preset`.
pub fn export_scene<E: SceneEngine + ?Sized>(
    engine: &E,
    preset: ExportPreset,
    naming: &ExportNaming,
) -> Result<ExportArtifact, GalleryError> {
    naming.validate()?;

    let options = preset.render_options();
    options.validate()?;

    let image = engine.render_to_image(&options)?;
    if image.format != preset.format() {
        tracing::warn!(
            requested = ?preset.format(),
            produced = ?image.format,
            "engine returned a different image format"
        );
    }

    let filename = naming.filename(preset);
    tracing::info!(
        preset = ?preset,
        filename = %filename,
        bytes = image.bytes.len(),
        "exported stamp"
    );

    Ok(ExportArtifact { filename, image })
}
