//! The capability every voter is backed by.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Context, IpProtocol, SourceError};

/// Something that can report the caller's external IP address.
///
/// Implementations must:
/// - only return `Ok` with a specified address (never `0.0.0.0` or `::`),
/// - restrict their own network attempts to `protocol` unless it is
///   [`IpProtocol::Any`],
/// - stop promptly once `ctx` is done. The consensus never aborts a
///   source, so a source that ignores `ctx` keeps running after the
///   resolution has returned.
#[async_trait]
pub trait Source: Send + Sync {
    async fn resolve(&self, ctx: &Context, protocol: IpProtocol) -> Result<IpAddr, SourceError>;
}

/// A source paired with the weight of its vote.
///
/// Weight acts as a multiplier: the more weight, the more influence the
/// source has on the outcome. Always at least 1.
#[derive(Clone)]
pub struct Voter {
    source: Arc<dyn Source>,
    weight: u32,
}

impl Voter {
    pub(crate) fn new(source: Arc<dyn Source>, weight: u32) -> Self {
        debug_assert!(weight > 0);
        Self { source, weight }
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }
}

impl std::fmt::Debug for Voter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voter").field("weight", &self.weight).finish_non_exhaustive()
    }
}
