// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the probe modules and the orchestrator that drives them.
pub mod cdn_scanner;
pub mod dns_scanner;
pub mod fingerprint_scanner;
pub mod headers_scanner;
pub mod ssl_scanner;
pub mod tech_scanner;

use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{info, warn};
use url::Url;

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::models::{HeaderSet, Probe, ScanReport, ScanRequest};
use self::cdn_scanner::{run_cdn_scan, server_info};
use self::dns_scanner::{build_resolver, run_dns_scan};
use self::headers_scanner::{audit_security_headers, fetch_headers};
use self::ssl_scanner::run_ssl_scan;
use self::tech_scanner::run_tech_scan;

/// The branches of a scan, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ScanKind {
    #[strum(to_string = "SSL/TLS")]
    Ssl,
    #[strum(to_string = "Technology")]
    Technology,
    #[strum(to_string = "CDN/Server")]
    Cdn,
    #[strum(to_string = "DNS")]
    Dns,
    #[strum(to_string = "Security Headers")]
    Headers,
}

impl ScanRequest {
    /// Whether the branch runs for this request; `all` enables every branch.
    pub fn wants(&self, kind: ScanKind) -> bool {
        self.all
            || match kind {
                ScanKind::Ssl => self.ssl,
                ScanKind::Technology => self.cms,
                ScanKind::Cdn => self.cdn,
                ScanKind::Dns => self.dns,
                ScanKind::Headers => self.headers,
            }
    }
}

/// Validates a scan target: an absolute http(s) URL with a host.
pub fn parse_target(input: &str) -> Result<Url, ScanError> {
    let url = Url::parse(input.trim()).map_err(|source| ScanError::InvalidUrl {
        input: input.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScanError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScanError::MissingHost(input.to_string()));
    }
    Ok(url)
}

/// HTTP client shared by every HTTP probe of one scan.
pub fn build_http_client(config: &ScanConfig) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout())
        .danger_accept_invalid_certs(true)
        .user_agent(config.user_agent.clone());
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

/// Runs the requested branches one after another and assembles the report.
///
/// Branches run in a fixed order (SSL, technology, CDN/server info, DNS,
/// security headers). A failing branch is recorded in the report and never
/// stops the others. The response headers are fetched at most once and
/// shared by the CDN and security header branches.
pub async fn run_scan(request: &ScanRequest, config: &ScanConfig) -> ScanReport {
    let url = request.url.as_str();
    let host = request.hostname();
    info!(url, "Scan started.");

    let mut report = ScanReport::new(url);
    let client = build_http_client(config);
    let resolver = build_resolver(config.timeout(), config.dns_attempts);
    let mut headers: Option<Result<HeaderSet, String>> = None;

    for kind in ScanKind::iter().filter(|kind| request.wants(*kind)) {
        info!(branch = %kind, "Running scan branch.");
        match kind {
            ScanKind::Ssl => {
                report.ssl_info = Some(run_ssl_scan(host, config.timeout()).await.into());
            }
            ScanKind::Technology => match &client {
                Ok(client) => {
                    let tech = run_tech_scan(client, url).await;
                    report.technologies = Some(tech.technologies);
                    report.cms = Some(tech.cms);
                    report.javascript_frameworks = Some(tech.javascript_frameworks);
                }
                Err(e) => {
                    let error = e.to_string();
                    report.technologies = Some(Probe::failed(&error));
                    report.cms = Some(Probe::failed(&error));
                    report.javascript_frameworks = Some(Probe::failed(error));
                }
            },
            ScanKind::Cdn => {
                let fetched = cached_headers(&mut headers, &client, url).await;
                let verdict = run_cdn_scan(fetched.ok(), &resolver, host).await;
                report.server_info = Some(server_info(fetched.ok(), verdict));
            }
            ScanKind::Dns => {
                report.dns = Some(run_dns_scan(&resolver, host).await);
            }
            ScanKind::Headers => {
                let fetched = cached_headers(&mut headers, &client, url).await;
                let empty = HeaderSet::default();
                report.headers = Some(audit_security_headers(fetched.unwrap_or(&empty)));
            }
        }
    }

    info!(url, "Scan finished.");
    report
}

/// Fetches the response headers on first use and returns the cached outcome after that.
async fn cached_headers<'a>(
    cache: &'a mut Option<Result<HeaderSet, String>>,
    client: &reqwest::Result<reqwest::Client>,
    url: &str,
) -> Result<&'a HeaderSet, &'a str> {
    if cache.is_none() {
        let fetched = match client {
            Ok(client) => fetch_headers(client, url).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = &fetched {
            warn!(url, error = %e, "Header fetch failed, header-based results degrade to defaults.");
        }
        *cache = Some(fetched);
    }
    match cache {
        Some(Ok(headers)) => Ok(headers),
        Some(Err(e)) => Err(e.as_str()),
        None => Err("headers were not fetched"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request(url: &str) -> ScanRequest {
        ScanRequest {
            url: parse_target(url).unwrap(),
            ssl: false,
            cms: false,
            headers: false,
            cdn: false,
            dns: false,
            all: false,
        }
    }

    fn test_config() -> ScanConfig {
        ScanConfig {
            timeout_secs: 2,
            dns_attempts: 1,
            use_system_proxy: false,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn all_flag_enables_every_branch() {
        let mut req = request("https://example.com");
        assert!(ScanKind::iter().all(|kind| !req.wants(kind)));
        req.all = true;
        assert!(ScanKind::iter().all(|kind| req.wants(kind)));
    }

    #[test]
    fn cms_flag_drives_the_technology_branch() {
        let mut req = request("https://example.com");
        req.cms = true;
        let wanted: Vec<ScanKind> = ScanKind::iter().filter(|kind| req.wants(*kind)).collect();
        assert_eq!(wanted, vec![ScanKind::Technology]);
    }

    #[test]
    fn targets_must_be_absolute_http_urls() {
        assert_eq!(parse_target("https://example.com").unwrap().as_str(), "https://example.com/");
        assert!(matches!(parse_target("example.com"), Err(ScanError::InvalidUrl { .. })));
        assert!(matches!(parse_target("ftp://example.com/"), Err(ScanError::UnsupportedScheme(_))));
        assert!(matches!(parse_target("https://"), Err(ScanError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn no_flags_yield_only_the_url() {
        let report = run_scan(&request("https://example.com"), &test_config()).await;
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"url": "https://example.com/"})
        );
    }

    #[tokio::test]
    async fn headers_are_fetched_once_for_cdn_and_audit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { ([("x-frame-options", "DENY"), ("server", "nginx")], "ok") }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut req = request(&format!("http://{addr}/"));
        req.cdn = true;
        req.headers = true;
        let report = run_scan(&req, &test_config()).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let info = report.server_info.unwrap();
        assert_eq!(info.server, "nginx");
        assert_eq!(info.cdn, "Unknown");
        let headers = report.headers.unwrap();
        assert_eq!(headers[2].0, "X-Frame-Options");
        assert_eq!(headers[2].1.status, "Present (DENY)");
        assert!(report.ssl_info.is_none());
        assert!(report.dns.is_none());
    }

    #[tokio::test]
    async fn unreachable_target_still_produces_every_section() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut req = request(&format!("http://{addr}/"));
        req.cms = true;
        req.cdn = true;
        req.headers = true;
        let report = run_scan(&req, &test_config()).await;

        assert!(report.technologies.unwrap().error().is_some());
        assert!(report.cms.unwrap().error().is_some());
        let info = report.server_info.unwrap();
        assert_eq!(info.server, "Unknown");
        let headers = report.headers.unwrap();
        assert_eq!(headers.len(), 7);
        assert!(headers.iter().all(|(_, status)| status.status == "Not Found"));
    }
}
