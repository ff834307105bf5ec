// User-facing notifications produced by session operations.

use serde::Serialize;
use stamp_gallery::GalleryError;

use super::session::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// Message shown when an operation fails with `err`.
    pub fn from_error(err: &SessionError) -> Self {
        match err {
            SessionError::Gallery(GalleryError::EmptyName) => {
                Self::error("Please enter a stamp name")
            }
            SessionError::Gallery(GalleryError::Import(_)) => Self::error("Invalid stamp file"),
            SessionError::Gallery(GalleryError::NotFound { .. }) => {
                Self::error("That stamp is no longer in the gallery")
            }
            SessionError::EditsPending { .. } => {
                Self::warning("Wait for the current edit to finish")
            }
            other => Self::error(other.to_string()),
        }
    }
}
