//! Persisted store access for herb-taxa
//!
//! Free functions over a `SqlitePool`, one module per table. Writes go
//! through `retry_on_lock`; reads are plain queries.

pub mod batches;
pub mod review;
pub mod settings;
pub mod taxa;
