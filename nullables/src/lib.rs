//! Nullable infrastructure for deterministic testing.
//!
//! Real sources talk to the network. The nullables here implement the same
//! [`Source`](extip_consensus::Source) capability but:
//! - Return pre-configured answers or failures
//! - Can be delayed, made to hang, or made to ignore cancellation
//! - Record how they were called, for assertions
//!
//! Usage: register nullables as voters in place of HTTP sources.

pub mod source;

pub use source::NullSource;
