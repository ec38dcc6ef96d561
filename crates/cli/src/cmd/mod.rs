//! CLI command implementations

pub mod config;
pub mod diff;
pub mod gc;
pub mod init;
pub mod log;
pub mod restore;
pub mod show;
pub mod snapshot;
pub mod status;
pub mod verify;
