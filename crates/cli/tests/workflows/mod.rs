//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

pub mod config;
pub mod maintenance;
pub mod restore;
pub mod snapshot_lifecycle;
