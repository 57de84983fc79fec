//! HTTP source: the default way to ask a website for our external IP.
//!
//! One GET request per resolution, built on a fresh client with connection
//! pooling disabled so that many short-lived resolutions never leave idle
//! sockets behind. Address-family selection happens at connection time:
//! hostnames go through a filtering resolver and IP-literal URLs of the
//! wrong family are refused before any connection is attempted.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use extip_consensus::{Context, IpProtocol, Source, SourceError};

use crate::resolver::FamilyResolver;

const USER_AGENT: &str = concat!("extip/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns the raw body returned by a website into the textual IP.
///
/// Surrounding whitespace of the result is trimmed before parsing.
pub type ContentParser = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Requests the external IP from a URL via an HTTP GET request.
#[derive(Clone)]
pub struct HttpSource {
    url: String,
    parser: Option<ContentParser>,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parser: None,
        }
    }

    /// Run every response body through `parser` before parsing the IP.
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn client(protocol: IpProtocol) -> Result<reqwest::Client, SourceError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(0)
            .no_proxy();
        if protocol != IpProtocol::Any {
            builder = builder.dns_resolver(Arc::new(FamilyResolver::new(protocol)));
        }
        builder
            .build()
            .map_err(|e| SourceError::Fetch(e.to_string()))
    }

    async fn fetch(&self, protocol: IpProtocol) -> Result<String, SourceError> {
        if let Some(host) = literal_host(&self.url) {
            if !protocol.matches(&host) {
                return Err(SourceError::WrongFamily);
            }
        }

        let client = Self::client(protocol)?;
        let resp = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        resp.text()
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))
    }
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("url", &self.url)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn resolve(&self, ctx: &Context, protocol: IpProtocol) -> Result<IpAddr, SourceError> {
        tracing::trace!(url = %self.url, %protocol, "querying IP source");

        let body = tokio::select! {
            biased;
            reason = ctx.done() => return Err(SourceError::Cancelled(reason)),
            body = self.fetch(protocol) => body?,
        };

        let raw = match &self.parser {
            Some(parser) => parser(&body).map_err(SourceError::Parser)?,
            None => body,
        };

        let ip = parse_ip(&raw)?;
        if !protocol.matches(&ip) {
            return Err(SourceError::WrongFamily);
        }
        Ok(ip)
    }
}

/// Parse the textual IP a source returned, ignoring surrounding whitespace.
///
/// Unspecified addresses (`0.0.0.0`, `::`) are rejected: they are never a
/// valid external address.
pub fn parse_ip(raw: &str) -> Result<IpAddr, SourceError> {
    let trimmed = raw.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(ip) if !ip.is_unspecified() => Ok(ip),
        _ => Err(SourceError::InvalidAddress(trimmed.to_string())),
    }
}

/// The host of `url` when it is an IP literal rather than a name.
fn literal_host(url: &str) -> Option<IpAddr> {
    let url = reqwest::Url::parse(url).ok()?;
    let host = url.host_str()?;
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
