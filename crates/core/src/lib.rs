//! Docver core primitives
//!
//! This crate provides:
//! - Version ids and records
//! - The `key: value` metadata codec
//! - The persisted, lock-protected version sequencer
//! - Storage layout and crash-safe file helpers
//! - BLAKE3 content hashing

pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod record;
pub mod sequencer;
pub mod store;

// Re-exports
pub use codec::{decode, decode_file, encode};
pub use config::StoreConfig;
pub use error::{DecodeError, VersionError, VersionResult};
pub use hash::{hash_bytes, hash_file, Blake3Hash};
pub use record::{sanitize_notes, VersionId, VersionRecord};
pub use sequencer::Sequencer;
pub use store::StoreLayout;
