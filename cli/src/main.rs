//! extip: print the external IP address agreed on by a weighted vote of
//! public IP services.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use extip_consensus::{Context, IpProtocol};
use extip_network::{ResolverConfig, VoterConfig};
use extip_utils::LogFormat;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "extip", about = "Resolve the external IP address by weighted consensus")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "EXTIP_CONFIG")]
    config: Option<PathBuf>,

    /// Address family to resolve: 0 (any), 4 or 6.
    #[arg(long, env = "EXTIP_PROTOCOL")]
    protocol: Option<u8>,

    /// Give up after this many seconds.
    #[arg(long, env = "EXTIP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Voter as URL=WEIGHT (repeatable or comma-separated).
    /// Replaces the configured voters entirely.
    #[arg(long = "voter", env = "EXTIP_VOTERS", value_delimiter = ',')]
    voters: Vec<VoterConfig>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "EXTIP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "EXTIP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print the result as a JSON object instead of a bare address.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Resolved {
    ip: String,
    protocol: u8,
}

/// Layer CLI flags over the config file (or the defaults).
fn load_config(cli: &Cli) -> anyhow::Result<ResolverConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("config path {} is not UTF-8", path.display()))?;
            ResolverConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config from {path}"))?
        }
        None => ResolverConfig::default(),
    };

    if let Some(protocol) = cli.protocol {
        config.protocol = IpProtocol::try_from(protocol)?;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    if !cli.voters.is_empty() {
        config.voters = cli.voters.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format.to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let log_format: LogFormat = config.log_format.parse()?;
    extip_utils::init_logging(log_format, &config.log_level);

    let consensus = config.build()?;
    tracing::info!(
        voters = consensus.voters().len(),
        protocol = %consensus.protocol(),
        timeout_secs = config.timeout_secs,
        "resolving external IP"
    );

    let token = CancellationToken::new();
    let ctx = Context::from_token(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received SIGINT, cancelling resolution");
            token.cancel();
        }
    });

    let ip = consensus.resolve_external_ip(&ctx).await?;

    if cli.json {
        let resolved = Resolved {
            ip: ip.to_string(),
            protocol: consensus.protocol().as_u8(),
        };
        println!("{}", serde_json::to_string(&resolved)?);
    } else {
        println!("{ip}");
    }
    Ok(())
}
