//! The resilient fetch state machine.
//!
//! A fetch is at most two strictly sequential attempts: the secure URL first,
//! then, only when the secure attempt died during TLS negotiation and a
//! fallback URL exists, one attempt over plain HTTP. Each attempt is a single
//! GET round trip with its own connect and read budgets, and every failure is
//! caught and classified; the connection is torn down on every exit path.

use super::types::{FetchRequest, USER_AGENT};
use crate::error::{FetchError, FetchResult};
use crate::infra::dns::resolve_host;
use crate::infra::tls::{client_config, TrustPolicy};
use http_body_util::{BodyExt, Empty};
use hyper::{body::Bytes, header, Method, Request};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

/// Resolved pieces of a target URL.
struct Target {
    host: String,
    port: u16,
    path: String,
    is_https: bool,
}

impl Target {
    fn from_url(url: &str) -> Result<Self, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("URL has no host".to_string()))?
            .to_string();

        let is_https = parsed.scheme() == "https";
        let port = parsed.port().unwrap_or(if is_https { 443 } else { 80 });
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };
        let path = if path.is_empty() { "/".to_string() } else { path };

        Ok(Self {
            host,
            port,
            path,
            is_https,
        })
    }
}

/// Runs the full secure-then-fallback sequence and returns the terminal
/// outcome. The fallback is issued only after the secure attempt has fully
/// completed, and only for trust failures; its outcome then replaces the
/// discarded secure error.
pub async fn fetch(request: &FetchRequest) -> FetchResult {
    let first = attempt(
        &request.secure_url,
        request.trust_policy,
        request.connect_timeout,
        request.read_timeout,
    )
    .await;

    match (first, &request.insecure_url) {
        (Err(error), Some(insecure_url)) if error.allows_fallback() => {
            tracing::warn!(%error, url = %insecure_url, "secure attempt failed in TLS negotiation, retrying over plain HTTP");
            attempt(
                insecure_url,
                request.trust_policy,
                request.connect_timeout,
                request.read_timeout,
            )
            .await
        }
        (outcome, _) => outcome,
    }
}

/// One GET round trip against a single URL.
pub async fn attempt(
    url: &str,
    trust_policy: TrustPolicy,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> FetchResult {
    let target = Target::from_url(url)?;
    tracing::debug!(url, https = target.is_https, "fetching");

    let ips = resolve_host(&target.host)
        .await
        .map_err(FetchError::Connect)?;
    let addr = SocketAddr::new(ips[0], target.port);

    // Explicit connect step; failures here never get re-attempted in place.
    let tcp_stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(FetchError::Connect(e.to_string())),
        Err(_) => return Err(FetchError::Connect("connect timed out".to_string())),
    };

    if target.is_https {
        let connector = TlsConnector::from(client_config(trust_policy));
        let server_name = rustls::pki_types::ServerName::try_from(target.host.clone())
            .map_err(|e| FetchError::Trust(format!("invalid server name: {}", e)))?;

        let tls_stream = match timeout(
            connect_timeout,
            connector.connect(server_name, tcp_stream),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(FetchError::Trust(e.to_string())),
            Err(_) => return Err(FetchError::Trust("TLS handshake timed out".to_string())),
        };

        exchange(tls_stream, &target, read_timeout).await
    } else {
        exchange(tcp_stream, &target, read_timeout).await
    }
}

/// Issues the GET over an established stream and reads the body.
///
/// The stream and the spawned connection task are dropped on every branch,
/// which closes the socket.
async fn exchange<S>(stream: S, target: &Target, read_timeout: Duration) -> FetchResult
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| FetchError::Protocol(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("connection closed with error: {}", e);
        }
    });

    let req = Request::builder()
        .method(Method::GET)
        .uri(target.path.as_str())
        .header(header::HOST, target.host.as_str())
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::ACCEPT, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| FetchError::Protocol(e.to_string()))?;

    // Either way no usable status came back, the legacy "code -1" outcome.
    let response = match timeout(read_timeout, sender.send_request(req)).await {
        Ok(Ok(r)) => r,
        Ok(Err(e)) => return Err(FetchError::Protocol(e.to_string())),
        Err(_) => return Err(FetchError::Protocol("response timed out".to_string())),
    };

    let status = response.status().as_u16();
    tracing::debug!(status, "response received");

    if !(200..300).contains(&status) {
        return Err(FetchError::Response(status));
    }

    // Full-buffer read; response bodies at this scale are small JSON.
    let body = match timeout(read_timeout, response.into_body().collect()).await {
        Ok(Ok(collected)) => collected.to_bytes(),
        Ok(Err(e)) => return Err(FetchError::Read(e.to_string())),
        Err(_) => return Err(FetchError::Read("body read timed out".to_string())),
    };

    tracing::debug!(bytes = body.len(), "body read");
    Ok(String::from_utf8_lossy(&body).into_owned())
}
