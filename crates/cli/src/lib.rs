//! Docver CLI library
//!
//! Command implementations and configuration for the `dv` binary.

pub mod cmd;
pub mod context;
pub mod logging;
pub mod system_config;
pub mod util;

pub use context::AppContext;
