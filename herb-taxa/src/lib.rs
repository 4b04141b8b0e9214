//! herb-taxa library interface
//!
//! Taxonomic tree resolution and lifecycle engine for the herbarium
//! digitization pipeline. Raw name rows go in; existing or newly created
//! taxon node ids come out, and whole import batches can be rolled back.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod names;
pub mod services;
pub mod utils;

pub use crate::error::{ErrorSeverity, TaxaError, TaxaResult};
