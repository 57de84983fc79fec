//! Resolver configuration with TOML file support.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use extip_consensus::{ConfigError, Consensus, ConsensusError, IpProtocol};
use serde::{Deserialize, Serialize};

use crate::{HttpSource, NetworkError};

/// TLS-protected providers carry more weight than plain-text ones.
pub const DEFAULT_VOTERS: &[(&str, u32)] = &[
    ("https://icanhazip.com/", 3),
    ("https://myexternalip.com/raw", 3),
    ("http://ifconfig.io/ip", 1),
    ("http://checkip.amazonaws.com/", 1),
    ("http://ident.me/", 1),
    ("http://whatismyip.akamai.com/", 1),
    ("http://myip.dnsomatic.com/", 1),
    ("http://diagnostic.opendns.com/myip", 1),
];

/// One HTTP voter: where to ask, and how much to trust the answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterConfig {
    pub url: String,

    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// Parses `URL=WEIGHT`, or a bare `URL` with weight 1.
impl FromStr for VoterConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (url, weight) = match s.rsplit_once('=') {
            Some((url, weight)) => {
                let weight = weight
                    .trim()
                    .parse()
                    .map_err(|e| format!("invalid weight in {s:?}: {e}"))?;
                (url, weight)
            }
            None => (s, default_weight()),
        };
        Ok(Self {
            url: url.trim().to_string(),
            weight,
        })
    }
}

/// Configuration for resolving the external IP.
///
/// Can be loaded from a TOML file via [`ResolverConfig::from_toml_file`] or
/// built programmatically. Every field has a default, so an empty file
/// yields the recommended voter set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Address family: 0 (any), 4 or 6.
    #[serde(default)]
    pub protocol: IpProtocol,

    /// Deadline for a resolution when the caller sets none.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Voters to register, in order.
    #[serde(default = "default_voters")]
    pub voters: Vec<VoterConfig>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_weight() -> u32 {
    1
}

fn default_timeout_secs() -> u64 {
    extip_consensus::DEFAULT_TIMEOUT.as_secs()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_voters() -> Vec<VoterConfig> {
    DEFAULT_VOTERS
        .iter()
        .map(|&(url, weight)| VoterConfig {
            url: url.to_string(),
            weight,
        })
        .collect()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ResolverConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NetworkError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NetworkError> {
        toml::from_str(s).map_err(|e| NetworkError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NetworkError> {
        toml::to_string_pretty(self).map_err(|e| NetworkError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a consensus with one [`HttpSource`] voter per configured entry.
    pub fn build(&self) -> Result<Consensus, NetworkError> {
        let mut consensus = Consensus::new()
            .with_protocol(self.protocol)
            .with_timeout(self.timeout());

        for voter in &self.voters {
            let url = voter.url.trim();
            if url.is_empty() {
                return Err(ConsensusError::from(ConfigError::MissingSource).into());
            }
            consensus.add_voter(Arc::new(HttpSource::new(url)), voter.weight)?;
        }

        tracing::debug!(
            voters = consensus.voters().len(),
            protocol = %consensus.protocol(),
            timeout_secs = self.timeout_secs,
            "consensus configured"
        );
        Ok(consensus)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            protocol: IpProtocol::Any,
            timeout_secs: default_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            voters: default_voters(),
        }
    }
}
