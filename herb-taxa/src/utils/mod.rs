//! Utility modules for herb-taxa

pub mod retry;

pub use retry::{retry_on_lock, retry_with_backoff};
