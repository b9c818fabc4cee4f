//! TLS infrastructure with a configurable trust policy.
//!
//! Legacy e-ink devices ship root stores that are a decade out of date, so
//! standard chain validation fails against current server certificates. The
//! [`TrustPolicy::AcceptAll`] mode exists for exactly that situation: it skips
//! certificate validation entirely. It is a deliberate, bounded security
//! downgrade and is never applied implicitly; hosts that can validate
//! certificates should use [`TrustPolicy::Strict`].

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::sync::{Arc, OnceLock};

/// How the server certificate is evaluated during the TLS handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Standard validation against the Mozilla root store.
    Strict,
    /// Accept any certificate chain without validation. Compatibility mode
    /// for devices whose bundled roots can no longer anchor current chains.
    AcceptAll,
}

/// Returns the client configuration for the given policy.
///
/// When the accept-all configuration cannot be constructed on this runtime,
/// the caller silently gets the strict configuration instead of a failed
/// request.
pub fn client_config(policy: TrustPolicy) -> Arc<rustls::ClientConfig> {
    match policy {
        TrustPolicy::Strict => strict_config(),
        TrustPolicy::AcceptAll => accept_all_config().unwrap_or_else(|| {
            tracing::warn!("accept-all TLS config unavailable, using standard validation");
            strict_config()
        }),
    }
}

/// Creates a TLS client configuration with Mozilla's root certificates.
pub fn strict_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Process-wide accept-all configuration, built at most once.
static ACCEPT_ALL_CONFIG: OnceLock<Option<Arc<rustls::ClientConfig>>> = OnceLock::new();

/// Returns the shared accept-all configuration, constructing it on first use.
///
/// `None` means no workable protocol version set could be negotiated with the
/// crypto provider; callers fall back to [`strict_config`].
pub fn accept_all_config() -> Option<Arc<rustls::ClientConfig>> {
    ACCEPT_ALL_CONFIG.get_or_init(build_accept_all_config).clone()
}

fn build_accept_all_config() -> Option<Arc<rustls::ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    // Prefer the default version set, fall back to TLS 1.2 alone for runtimes
    // where the newer versions are unavailable.
    let builder = match rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(rustls::DEFAULT_VERSIONS)
    {
        Ok(builder) => builder,
        Err(e) => {
            tracing::debug!(error = %e, "default TLS versions rejected, trying TLS 1.2 only");
            match rustls::ClientConfig::builder_with_provider(provider.clone())
                .with_protocol_versions(&[&rustls::version::TLS12])
            {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to construct accept-all TLS config");
                    return None;
                }
            }
        }
    };

    let verifier: Arc<dyn ServerCertVerifier> = Arc::new(AcceptAllVerifier { provider });
    let config = builder
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    tracing::debug!("constructed accept-all TLS config");
    Some(Arc::new(config))
}

/// Certificate verifier that approves every chain and signature.
///
/// Performs no validation and advertises no accepted issuers. Used only
/// behind [`TrustPolicy::AcceptAll`].
#[derive(Debug)]
struct AcceptAllVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_config_is_constructed_once() {
        let first = accept_all_config().expect("accept-all config should build with ring");
        let second = accept_all_config().expect("accept-all config should build with ring");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn client_config_resolves_both_policies() {
        // Both policies must always yield a usable configuration.
        let _ = client_config(TrustPolicy::Strict);
        let _ = client_config(TrustPolicy::AcceptAll);
    }
}
