//! Detection History Common Library
//!
//! CLIとWeb(WASM)で共有される検出履歴・プレビューキャッシュ・Undoのコア

pub mod types;
pub mod error;
pub mod store;
pub mod clock;
pub mod scheduler;
pub mod history;
pub mod preview;
pub mod undo;
pub mod facade;
pub mod export;

pub use types::{BoxDetection, DetectionRecord, DetectionResponse, PreviewPair};
pub use error::{Error, Result};
pub use store::{KeyValueStore, MemoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{ManualScheduler, NoopScheduler, ScheduledTask, Scheduler, UndoTicket};
pub use history::{HistoryStore, DEFAULT_STORAGE_KEY, HISTORY_CAPACITY};
pub use preview::PreviewCache;
pub use undo::{UndoController, UndoItem, UndoKind, UndoSnapshot, UNDO_WINDOW};
pub use facade::DetectionHistory;
