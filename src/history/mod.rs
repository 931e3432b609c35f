pub mod storage;
pub mod types;

pub use storage::{HistoryStorage, DEFAULT_HISTORY_LIMIT, HISTORY_KEY};
pub use types::{HistoryItem, PageInfo};
