use thiserror::Error;

/// Failures while loading configuration or building a consensus from it.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The configuration could not be parsed, serialised or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Building the consensus rejected a voter or the protocol.
    #[error("consensus error: {0}")]
    Consensus(#[from] extip_consensus::ConsensusError),

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
