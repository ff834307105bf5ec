//! stamp-editor: the editing session for Stamp Studio.
//!
//! Design rules:
//! - One session owns one live scene, one undo history and one gallery.
//! - Undo is whole-scene snapshots, bounded, strictly linear.
//! - Edits reach the history in the order they were started, not finished.
//! - Failures never leave history or gallery half-updated; they become notices.

pub mod config;
pub mod editor;
pub mod logging;

pub use config::{ConfigError, EditorConfig};
pub use editor::{
    EditQueue, EditTicket, History, HistoryError, Notice, NoticeLevel, QueueError, Session,
    SessionError, Step,
};
pub use logging::init_tracing;
