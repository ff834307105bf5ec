//! Built-in quick templates offered on the template picker.

use serde::{Deserialize, Serialize};

/// Template grouping shown as a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Business,
    Personal,
    Creative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Label drawn in the middle of the stamp.
    pub preview: &'static str,
    pub category: TemplateCategory,
}

const TEMPLATES: &[StampTemplate] = &[
    StampTemplate {
        id: "approved",
        name: "Approved",
        description: "Classic approval stamp",
        preview: "✓ APPROVED",
        category: TemplateCategory::Business,
    },
    StampTemplate {
        id: "urgent",
        name: "Urgent",
        description: "High priority marker",
        preview: "⚡ URGENT",
        category: TemplateCategory::Business,
    },
    StampTemplate {
        id: "confidential",
        name: "Confidential",
        description: "Security marking",
        preview: "🔒 CONFIDENTIAL",
        category: TemplateCategory::Business,
    },
    StampTemplate {
        id: "date",
        name: "Date Stamp",
        description: "Custom date marker",
        preview: "📅 DATE",
        category: TemplateCategory::Business,
    },
    StampTemplate {
        id: "star",
        name: "Star Badge",
        description: "Achievement marker",
        preview: "⭐ EXCELLENT",
        category: TemplateCategory::Personal,
    },
    StampTemplate {
        id: "heart",
        name: "Love Stamp",
        description: "Affection marker",
        preview: "💝 WITH LOVE",
        category: TemplateCategory::Personal,
    },
];

pub fn builtin_templates() -> &'static [StampTemplate] {
    TEMPLATES
}

pub fn find_template(id: &str) -> Option<&'static StampTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

pub fn templates_in(category: TemplateCategory) -> impl Iterator<Item = &'static StampTemplate> {
    TEMPLATES.iter().filter(move |t| t.category == category)
}
