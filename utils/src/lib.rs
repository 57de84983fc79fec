//! Shared utilities for extip.

pub mod logging;

pub use logging::{init_logging, LogFormat};
