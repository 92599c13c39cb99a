// src/core/scanner/headers_scanner.rs

use tracing::{debug, info, warn};

use crate::core::error::ProbeError;
use crate::core::knowledge_base::{HSTS_MIN_MAX_AGE, SECURITY_HEADERS};
use crate::core::models::{HeaderSet, HeaderStatus, SecurityHeaderReport};

const HSTS: &str = "Strict-Transport-Security";

/// Sends one GET request to the target and returns the response headers.
///
/// No retries: callers degrade to "Unknown"/absent values when this fails.
///
/// # Arguments
/// * `client` - HTTP client carrying the timeout and TLS settings of the scan.
/// * `url` - Absolute URL of the target.
pub async fn fetch_headers(client: &reqwest::Client, url: &str) -> Result<HeaderSet, ProbeError> {
    info!(url, "Fetching response headers.");
    let response = client.get(url).send().await.map_err(|e| {
        warn!(url, error = %e, "HTTP request failed for headers fetch.");
        ProbeError::Http(e)
    })?;
    info!(status = %response.status(), count = response.headers().len(), "Received response headers.");
    Ok(HeaderSet::new(response.headers().clone()))
}

/// Checks every header of the security checklist against the response headers.
///
/// Lookups ignore case. The advice of each entry is returned unchanged
/// whatever the detected status.
///
/// # Returns
/// One `(header, status)` entry per checklist header, in checklist order.
pub fn audit_security_headers(headers: &HeaderSet) -> SecurityHeaderReport {
    debug!("Analyzing security headers.");
    SECURITY_HEADERS
        .iter()
        .map(|check| {
            let status = match headers.get(check.header) {
                None => "Not Found".to_string(),
                Some(value) if value.is_empty() => "Empty value".to_string(),
                Some(value) if check.header == HSTS && value.contains("max-age=") => hsts_status(value),
                Some(value) => format!("Present ({value})"),
            };
            debug!(header = check.header, status = %status, "Header classified.");
            (
                check.header.to_string(),
                HeaderStatus { status, advice: check.advice.to_string() },
            )
        })
        .collect()
}

/// Grades an HSTS value that contains `max-age=`.
fn hsts_status(value: &str) -> String {
    let raw = value
        .split("max-age=")
        .nth(1)
        .and_then(|rest| rest.split(';').next())
        .unwrap_or_default();

    match raw.trim().parse::<i64>() {
        Ok(max_age) if max_age < HSTS_MIN_MAX_AGE => format!("Present but weak (max-age={max_age})"),
        Ok(_) => "Present and strong".to_string(),
        Err(_) => "Malformed value".to_string(),
    }
}
