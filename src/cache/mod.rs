pub mod history;
pub mod storage;

pub use history::HistoryCache;
pub use storage::{HistoryStorage, InMemoryStorage, LocalFileStorage};
