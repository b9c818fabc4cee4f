//! DNS resolution for the connect phase.
//!
//! A single process-wide resolver is initialized lazily and shared across
//! fetches; IP literals short-circuit without a lookup.

use hickory_resolver::{config::*, TokioAsyncResolver};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Trait for hostname resolution, kept narrow so tests can substitute a
/// canned implementation.
#[allow(async_fn_in_trait)]
pub trait DnsResolver: Send + Sync {
    /// Resolves a hostname to its addresses. An empty answer is an error.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, String>;
}

/// Global resolver instance, shared for connection reuse.
static DNS_RESOLVER: OnceCell<Arc<TokioAsyncResolver>> = OnceCell::const_new();

async fn shared_resolver() -> Arc<TokioAsyncResolver> {
    DNS_RESOLVER
        .get_or_init(|| async {
            Arc::new(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ))
        })
        .await
        .clone()
}

/// Resolver implementation backed by hickory-resolver.
#[derive(Default)]
pub struct HickoryDnsResolver;

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DnsResolver for HickoryDnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, String> {
        // Already an IP literal, no lookup needed.
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let resolver = shared_resolver().await;
        match resolver.lookup_ip(host).await {
            Ok(response) => {
                let ips: Vec<IpAddr> = response.iter().collect();
                if ips.is_empty() {
                    Err("DNS lookup returned no addresses".to_string())
                } else {
                    Ok(ips)
                }
            }
            Err(e) => Err(format!("DNS lookup failed: {}", e)),
        }
    }
}

/// Convenience function for resolution with the default resolver.
pub async fn resolve_host(host: &str) -> Result<Vec<IpAddr>, String> {
    HickoryDnsResolver::new().resolve(host).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_ipv4_literal_without_lookup() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn resolves_ipv6_literal_without_lookup() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("::1").await.unwrap();
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].to_string(), "::1");
    }
}
