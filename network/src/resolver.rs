//! DNS resolution restricted to one address family.
//!
//! Plugged into the HTTP client when a resolution asks for IPv4 or IPv6
//! only, so the connection can never be established over the other family.

use std::io;
use std::net::SocketAddr;

use extip_consensus::IpProtocol;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

pub(crate) struct FamilyResolver {
    protocol: IpProtocol,
}

impl FamilyResolver {
    pub(crate) fn new(protocol: IpProtocol) -> Self {
        Self { protocol }
    }
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(lookup(name.as_str().to_owned(), self.protocol))
    }
}

async fn lookup(
    host: String,
    protocol: IpProtocol,
) -> Result<Addrs, Box<dyn std::error::Error + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .filter(|addr| protocol.matches(&addr.ip()))
        .collect();
    if addrs.is_empty() {
        let err = io::Error::new(
            io::ErrorKind::NotFound,
            format!("{host} has no {protocol} address"),
        );
        return Err(err.into());
    }
    Ok(Box::new(addrs.into_iter()))
}
