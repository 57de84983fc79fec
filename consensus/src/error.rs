use thiserror::Error;

use crate::context::Cancelled;

/// Rejected registration or configuration input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no source provided")]
    MissingSource,

    #[error("weight cannot be 0")]
    ZeroWeight,

    #[error("unsupported IP protocol {0}: only 0 (any), 4 and 6 are supported")]
    InvalidProtocol(u8),
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no IP could be found")]
    NoConsensus,

    #[error("resolution aborted: {0}")]
    Cancelled(#[from] Cancelled),
}

/// Failure of a single source. The consensus discards these.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Fetch(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("returned an invalid IP: {0}")]
    InvalidAddress(String),

    #[error("address family does not match the requested protocol")]
    WrongFamily,

    #[error("content parser failed: {0}")]
    Parser(String),

    #[error("source aborted: {0}")]
    Cancelled(#[from] Cancelled),
}
