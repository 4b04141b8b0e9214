//! Test helper utilities
//!
//! Shared fixtures for herb-taxa integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod stub_service;

pub use db_utils::{assert_no_orphans, create_test_db, seed_taxon};
pub use stub_service::{FailingService, StubService};
