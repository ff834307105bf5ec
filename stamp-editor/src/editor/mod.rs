// Editor module for Stamp Studio.

pub mod history;
pub mod notice;
pub mod queue;
pub mod session;

pub use history::{History, HistoryError, Step, DEFAULT_MAX_STATES};
pub use notice::{Notice, NoticeLevel};
pub use queue::{EditQueue, EditTicket, QueueError};
pub use session::{Session, SessionError};
