//! # Herbarium Common Library
//!
//! Shared code for the herbarium digitization tools including:
//! - Error types
//! - Bootstrap configuration and root folder resolution
//! - Database initialization (taxon tree, batch ledger, review ledger)
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
