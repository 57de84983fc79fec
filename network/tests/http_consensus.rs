//! HTTP sources voting through a real consensus against loopback servers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use extip_consensus::{Consensus, ConsensusError, Context};
use extip_network::{HttpSource, ResolverConfig, VoterConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn serve(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// A port with nothing listening on it.
async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("local addr")
}

fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn trusted_sources_outvote_plain_ones() {
    let honest_a = serve("203.0.113.1\n").await;
    let honest_b = serve("203.0.113.1").await;
    let liar_a = serve("198.51.100.66").await;
    let liar_b = serve("198.51.100.66").await;

    let config = ResolverConfig {
        voters: vec![
            VoterConfig {
                url: format!("http://{honest_a}/"),
                weight: 3,
            },
            VoterConfig {
                url: format!("http://{honest_b}/"),
                weight: 3,
            },
            VoterConfig {
                url: format!("http://{liar_a}/"),
                weight: 1,
            },
            VoterConfig {
                url: format!("http://{liar_b}/"),
                weight: 1,
            },
        ],
        ..Default::default()
    };
    let consensus = config.build().expect("valid config");

    let got = consensus
        .resolve_external_ip(&Context::with_timeout(Duration::from_secs(10)))
        .await
        .expect("resolution should succeed");
    assert_eq!(got, ip("203.0.113.1"));
}

#[tokio::test]
async fn unreachable_sources_are_ignored() {
    let working = serve("192.0.2.10").await;
    let dead = closed_port().await;

    let mut consensus = Consensus::new();
    consensus
        .add_voter(Arc::new(HttpSource::new(format!("http://{dead}/"))), 10)
        .unwrap();
    consensus
        .add_voter(Arc::new(HttpSource::new(format!("http://{working}/"))), 1)
        .unwrap();

    let got = consensus
        .resolve_external_ip(&Context::with_timeout(Duration::from_secs(10)))
        .await
        .expect("one working source is enough");
    assert_eq!(got, ip("192.0.2.10"));
}

#[tokio::test]
async fn no_usable_answer_means_no_consensus() {
    let garbage = serve("<html>Too Many Requests</html>").await;
    let dead = closed_port().await;

    let mut consensus = Consensus::new();
    consensus
        .add_voter(Arc::new(HttpSource::new(format!("http://{garbage}/"))), 3)
        .unwrap();
    consensus
        .add_voter(Arc::new(HttpSource::new(format!("http://{dead}/"))), 1)
        .unwrap();

    let err = consensus
        .resolve_external_ip(&Context::with_timeout(Duration::from_secs(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsensusError::NoConsensus));
}

#[tokio::test]
async fn parsed_sources_vote_alongside_plain_ones() {
    let plain = serve("192.0.2.44").await;
    let wrapped = serve("{\"ip\":\"192.0.2.44\"}").await;

    let mut consensus = Consensus::new();
    consensus
        .add_voter(Arc::new(HttpSource::new(format!("http://{plain}/"))), 1)
        .unwrap();
    consensus
        .add_voter(
            Arc::new(
                HttpSource::new(format!("http://{wrapped}/")).with_parser(|body| {
                    body.split('"')
                        .nth(3)
                        .map(str::to_string)
                        .ok_or_else(|| format!("unexpected body {body:?}"))
                }),
            ),
            1,
        )
        .unwrap();

    let got = consensus
        .resolve_external_ip(&Context::with_timeout(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(got, ip("192.0.2.44"));
}

#[test]
fn default_consensus_has_recommended_voters() {
    let consensus = extip_network::default_consensus().expect("defaults are valid");
    assert_eq!(consensus.voters().len(), extip_network::DEFAULT_VOTERS.len());
    let total: u32 = consensus.voters().iter().map(|v| v.weight()).sum();
    assert_eq!(total, 3 + 3 + 6);
}
