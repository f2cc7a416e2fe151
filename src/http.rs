//! HTTP client with custom DNS resolver for cross-platform compatibility
//!
//! Uses hickory-dns with Cloudflare DNS (1.1.1.1) to avoid relying on
//! system DNS configuration, which may not exist on some platforms (e.g., Termux/Android).

use anyhow::{Context, Result};
use hickory_resolver::{config::ResolverConfig, name_server::TokioConnectionProvider, Resolver};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

type TokioResolver = Resolver<TokioConnectionProvider>;

/// Cap on redirects followed when reading pages
const MAX_REDIRECTS: usize = 10;

/// Custom DNS resolver that uses Cloudflare DNS (1.1.1.1)
/// Does not depend on /etc/resolv.conf
struct HickoryDnsResolver {
    resolver: Arc<TokioResolver>,
}

impl HickoryDnsResolver {
    fn new() -> Self {
        let resolver = Resolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .build();
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

/// `localhost` never leaves the machine, so it must not go to a public resolver
fn loopback_addrs(name: &str) -> Option<Vec<SocketAddr>> {
    let name = name.trim_end_matches('.');
    if name.eq_ignore_ascii_case("localhost") || name.to_ascii_lowercase().ends_with(".localhost") {
        Some(vec![
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0),
        ])
    } else {
        None
    }
}

impl Resolve for HickoryDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            if let Some(addrs) = loopback_addrs(name.as_str()) {
                return Ok(Box::new(addrs.into_iter()) as Addrs);
            }

            let lookup = resolver
                .lookup_ip(name.as_str())
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

            let addrs: Vec<SocketAddr> = lookup
                .iter()
                .map(|ip| SocketAddr::new(ip, 0))
                .collect();

            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Create an HTTP client builder with custom DNS resolver
/// This works on all platforms including Termux/Android
pub fn create_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .dns_resolver(Arc::new(HickoryDnsResolver::new()))
        .user_agent(concat!("websearch/", env!("CARGO_PKG_VERSION")))
}

/// Client for API calls (search, completions, the websearch endpoint)
pub fn create_client() -> Result<reqwest::Client> {
    create_client_builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")
}

/// Client for reading arbitrary web pages
pub fn create_page_client(timeout: Duration) -> Result<reqwest::Client> {
    create_client_builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .context("Failed to create page fetch client")
}
