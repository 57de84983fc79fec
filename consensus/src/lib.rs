//! External IP consensus: ask many sources, trust the weighted majority.
//!
//! Each registered [`Voter`] pairs a [`Source`] with a weight. A resolution
//! queries every source concurrently, adds each voter's weight to the
//! address it reported, and returns the address with the most weight.
//!
//! ## Module overview
//!
//! - [`consensus`]: Voter registration and the resolution algorithm.
//! - [`source`]: The single-method capability a voter is backed by.
//! - [`context`]: Cancellation token plus optional deadline.
//! - [`tally`]: Per-resolution weighted vote tally.
//! - [`protocol`]: Address-family filter (any / IPv4 / IPv6).
//! - [`error`]: Consensus, configuration and source error types.

pub mod consensus;
pub mod context;
pub mod error;
pub mod protocol;
pub mod source;
pub mod tally;

pub use consensus::{Consensus, DEFAULT_TIMEOUT};
pub use context::{Cancelled, Context};
pub use error::{ConfigError, ConsensusError, SourceError};
pub use protocol::IpProtocol;
pub use source::{Source, Voter};
pub use tally::VoteTally;
