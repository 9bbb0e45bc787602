//! Scan history.
//!
//! After every response the dispatcher hands a [`LogEntry`] to a
//! [`HistoryStore`]. Recording is best effort: a failing store is logged
//! and never changes the response.
//!
//! - [`JsonFileHistory`] - A capped JSON array on disk
//! - [`MemoryHistory`] - An in-process store for tests and embedding

mod entry;
mod file;
mod memory;
mod traits;

pub use entry::LogEntry;
pub use file::{JsonFileHistory, DEFAULT_HISTORY_CAPACITY};
pub use memory::MemoryHistory;
pub use traits::{ArcHistory, HistoryStore};
