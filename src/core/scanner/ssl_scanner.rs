// src/core/scanner/ssl_scanner.rs

use tracing::{debug, error, info};

use crate::core::error::ProbeError;
use crate::core::models::SslInfo;
use chrono::{DateTime, Utc};
use openssl::ssl::{SslConnector, SslMethod};
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::task::spawn_blocking;
use x509_parser::prelude::*;

const HTTPS_PORT: u16 = 443;

/// Inspects the certificate served by `target` on port 443.
///
/// The handshake uses the platform trust store with full certificate and
/// hostname verification, so untrusted or mismatched certificates end up as
/// an error rather than as data.
pub async fn run_ssl_scan(target: &str, timeout: Duration) -> Result<SslInfo, ProbeError> {
    info!(target, "Starting SSL/TLS scan.");

    let result = match resolve(target, HTTPS_PORT, timeout).await {
        Ok(addrs) => {
            let target_owned = target.to_string();
            debug!("Spawning blocking task for TLS connection.");
            spawn_blocking(move || perform_tls_scan(&target_owned, &addrs, timeout))
                .await
                .unwrap_or_else(|e| {
                    error!(panic = %e, "Blocking SSL scan task panicked!");
                    Err(ProbeError::Panicked(e.to_string()))
                })
        }
        Err(e) => Err(e),
    };

    match &result {
        Ok(info) => info!(issuer = %info.issuer, version = %info.tls_version, "SSL/TLS scan finished."),
        Err(e) => info!(error = %e, "SSL/TLS scan failed."),
    }
    result
}

/// Resolves every address of `target`, bounded by `timeout`.
async fn resolve(target: &str, port: u16, timeout: Duration) -> Result<Vec<SocketAddr>, ProbeError> {
    let addrs: Vec<SocketAddr> = tokio::time::timeout(timeout, lookup_host((target, port)))
        .await
        .map_err(|_| ProbeError::Resolve(format!("{target} (timed out)")))?
        .map_err(|e| ProbeError::Resolve(format!("{target} ({e})")))?
        .collect();
    debug!(target, count = addrs.len(), "Resolved target addresses.");
    if addrs.is_empty() {
        return Err(ProbeError::Resolve(target.to_string()));
    }
    Ok(addrs)
}

/// Tries each address in turn; the last failure is reported when none answers.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream, ProbeError> {
    let mut last_error = None;
    for addr in addrs {
        debug!(%addr, "Connecting TCP stream.");
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "Address did not answer.");
                last_error = Some(e);
            }
        }
    }
    let e = last_error
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to connect to"));
    error!(error = %e, "TCP connection failed");
    Err(ProbeError::Connect(e))
}

fn perform_tls_scan(target: &str, addrs: &[SocketAddr], timeout: Duration) -> Result<SslInfo, ProbeError> {
    let stream = connect_any(addrs, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let connector = SslConnector::builder(SslMethod::tls())
        .map_err(|e| ProbeError::Handshake(e.to_string()))?
        .build();

    debug!(target, "Performing TLS handshake.");
    let stream = connector.connect(target, stream).map_err(|e| {
        error!(error = %e, "TLS handshake failed");
        ProbeError::Handshake(e.to_string())
    })?;

    let tls_version = stream.ssl().version_str().to_string();
    let cert = stream.ssl().peer_certificate().ok_or(ProbeError::NoCertificate)?;
    let cert_der = cert.to_der().map_err(|e| ProbeError::Certificate(e.to_string()))?;

    let (_, x509) = parse_x509_certificate(&cert_der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        ProbeError::Certificate(e.to_string())
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");
    Ok(describe_certificate(&x509, tls_version))
}

fn describe_certificate(x509: &X509Certificate<'_>, tls_version: String) -> SslInfo {
    let validity = x509.validity();
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);

    SslInfo {
        issuer: common_name(x509.issuer()),
        subject: common_name(x509.subject()),
        not_before: format_cert_date(not_before),
        not_after: format_cert_date(not_after),
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
        tls_version,
    }
}

fn common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .unwrap_or("Unknown")
        .to_string()
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

/// OpenSSL's certificate date layout, e.g. `Mar  4 08:00:00 2025 GMT`.
fn format_cert_date(date: DateTime<Utc>) -> String {
    date.format("%b %e %H:%M:%S %Y GMT").to_string()
}
