//! Network-facing IP sources for the extip consensus.
//!
//! Provides the HTTP source, the TOML-backed resolver configuration, and
//! the recommended default voter set.

pub mod config;
pub mod error;
pub mod http;
mod resolver;

pub use config::{ResolverConfig, VoterConfig, DEFAULT_VOTERS};
pub use error::NetworkError;
pub use http::{parse_ip, ContentParser, HttpSource};

use extip_consensus::Consensus;

/// A consensus filled with the default and recommended HTTP sources.
///
/// TLS-protected providers get weight 3, plain-text providers weight 1.
pub fn default_consensus() -> Result<Consensus, NetworkError> {
    ResolverConfig::default().build()
}
