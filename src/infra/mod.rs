//! Infrastructure layer for the network boundary.
//!
//! This module contains traits and implementations for:
//! - DNS resolution
//! - TLS connections and trust policy

pub mod dns;
pub mod tls;

pub use dns::{resolve_host, DnsResolver, HickoryDnsResolver};
pub use tls::{accept_all_config, client_config, strict_config, TrustPolicy};
