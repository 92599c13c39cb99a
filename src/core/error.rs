// src/core/error.rs

use thiserror::Error;

/// Failure of a single probe. Always converted into a report entry, never
/// propagated out of the aggregator.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not resolve {0}")]
    Resolve(String),

    #[error("TCP Connection Error: {0}")]
    Connect(#[from] std::io::Error),

    #[error("TLS Handshake Error: {0}")]
    Handshake(String),

    #[error("Server did not provide a certificate")]
    NoCertificate,

    #[error("X.509 Parse Error: {0}")]
    Certificate(String),

    #[error("Task panicked: {0}")]
    Panicked(String),
}

/// A scan that cannot start at all because its target is unusable.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("URL '{0}' has no host")]
    MissingHost(String),
}
