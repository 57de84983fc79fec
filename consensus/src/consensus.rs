//! The consensus: resolve the external IP by weighted vote.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;

use crate::{ConfigError, ConsensusError, Context, IpProtocol, Source, VoteTally, Voter};

/// Deadline applied to a resolution when the caller's context has none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The type at the center of this library.
///
/// Register sources with [`add_voter`](Self::add_voter), then call
/// [`resolve_external_ip`](Self::resolve_external_ip) as often as needed.
/// Every resolution queries all voters concurrently and returns the address
/// that received the most weight.
///
/// Registration takes `&mut self` and resolution takes `&self`, so voters
/// cannot be added while a resolution is in flight. Callers sharing a
/// consensus across tasks must finish configuring it before sharing it.
pub struct Consensus {
    voters: Vec<Voter>,
    protocol: IpProtocol,
    timeout: Duration,
}

impl std::fmt::Debug for Consensus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consensus")
            .field("voters", &self.voters.len())
            .field("protocol", &self.protocol)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Consensus {
    /// Create an empty consensus with no voters.
    pub fn new() -> Self {
        Self {
            voters: Vec::new(),
            protocol: IpProtocol::Any,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the default resolution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start with the given address-family filter.
    pub fn with_protocol(mut self, protocol: IpProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Deadline applied when the caller's context carries none.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Register a voter. The weight has to be 1 or above.
    pub fn add_voter(&mut self, source: Arc<dyn Source>, weight: u32) -> Result<(), ConsensusError> {
        if weight == 0 {
            return Err(ConfigError::ZeroWeight.into());
        }
        self.voters.push(Voter::new(source, weight));
        Ok(())
    }

    /// Restrict subsequent resolutions to one address family.
    ///
    /// Accepts `0` (any), `4` or `6`. Any other value is rejected and the
    /// current filter is kept.
    pub fn use_ip_protocol(&mut self, protocol: u8) -> Result<(), ConsensusError> {
        self.protocol = IpProtocol::try_from(protocol)?;
        Ok(())
    }

    /// The current address-family filter.
    pub fn protocol(&self) -> IpProtocol {
        self.protocol
    }

    /// The default resolution timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registered voters in registration order.
    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    /// Resolve the external IP from all registered voters.
    ///
    /// Returns the address with the greatest accumulated weight once every
    /// voter has answered. Voters that fail, or that answer with an
    /// unspecified address or one outside the configured family, do not
    /// vote. Ties go to the lowest address.
    ///
    /// If `ctx` is done first, returns [`ConsensusError::Cancelled`]
    /// immediately. When `ctx` carries no deadline the consensus timeout is
    /// applied. Voters still running at that point are not aborted; their
    /// context is cancelled and any late vote lands in a tally nobody reads.
    pub async fn resolve_external_ip(&self, ctx: &Context) -> Result<IpAddr, ConsensusError> {
        if let Some(reason) = ctx.err() {
            tracing::debug!(%reason, "context done before resolution started");
            return Err(reason.into());
        }

        let ctx = ctx.child(self.timeout);
        let _cancel_on_return = ctx.token().clone().drop_guard();
        let protocol = self.protocol;
        let tally = Arc::new(Mutex::new(VoteTally::new()));

        tracing::debug!(
            voters = self.voters.len(),
            %protocol,
            "resolving external IP"
        );

        let ballots: Vec<_> = self
            .voters
            .iter()
            .map(|voter| {
                let source = Arc::clone(voter.source());
                let weight = voter.weight();
                let ctx = ctx.clone();
                let tally = Arc::clone(&tally);
                tokio::spawn(async move {
                    let Ok(ip) = source.resolve(&ctx, protocol).await else {
                        return;
                    };
                    let ip = ip.to_canonical();
                    if ip.is_unspecified() || !protocol.matches(&ip) {
                        return;
                    }
                    tally.lock().await.add(ip, weight);
                })
            })
            .collect();

        tokio::select! {
            biased;
            reason = ctx.done() => {
                tracing::debug!(%reason, "resolution abandoned before all voters answered");
                return Err(reason.into());
            }
            _ = join_all(ballots) => {}
        }

        let tally = tally.lock().await;
        match tally.winner() {
            Some((ip, weight)) => {
                tracing::debug!(
                    %ip,
                    weight,
                    candidates = tally.len(),
                    "external IP resolved"
                );
                Ok(ip)
            }
            None => {
                tracing::debug!("no voter produced a usable address");
                Err(ConsensusError::NoConsensus)
            }
        }
    }
}

impl Default for Consensus {
    fn default() -> Self {
        Self::new()
    }
}
