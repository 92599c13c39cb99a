// src/app.rs

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::core::error::ScanError;
use crate::core::models::{ScanReport, ScanRequest};
use crate::core::scanner::{parse_target, run_scan};
use crate::ui::{OutputFormatter, Tone};

/// Which scan branches the user asked for on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFlags {
    pub ssl: bool,
    pub cms: bool,
    pub headers: bool,
    pub cdn: bool,
    pub dns: bool,
    pub all: bool,
}

/// One CLI invocation: a validated request plus how to present it.
pub struct App {
    pub request: ScanRequest,
    pub config: ScanConfig,
    pub save: Option<PathBuf>,
    pub formatter: OutputFormatter,
}

impl App {
    pub fn new(
        request: ScanRequest,
        config: ScanConfig,
        save: Option<PathBuf>,
        formatter: OutputFormatter,
    ) -> Self {
        Self { request, config, save, formatter }
    }

    /// Runs the scan, saves the report when asked, then prints it.
    pub async fn run(&self) -> Result<ScanReport> {
        println!(
            "{}",
            self.formatter.paint(format!("[*] Starting scan on: {}", self.request.url), Tone::Yellow)
        );

        let report = run_scan(&self.request, &self.config).await;

        if let Some(path) = &self.save {
            save_report(&report, path)?;
            println!(
                "{}",
                self.formatter.paint(format!("[✓] Output saved to {}", path.display()), Tone::Green)
            );
        }

        let ip = resolve_ip(self.request.hostname()).await;
        for line in self.formatter.render_report(&report, &ip) {
            println!("{line}");
        }
        Ok(report)
    }
}

/// Builds a scan request from raw CLI input. Input without an `http://` or
/// `https://` prefix is taken as an https target.
pub fn build_request(input: &str, flags: ScanFlags) -> Result<ScanRequest, ScanError> {
    let input = input.trim();
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = parse_target(&with_scheme)?;
    debug!(%url, "Target accepted.");
    Ok(ScanRequest {
        url,
        ssl: flags.ssl,
        cms: flags.cms,
        headers: flags.headers,
        cdn: flags.cdn,
        dns: flags.dns,
        all: flags.all,
    })
}

/// Writes the report as JSON indented with four spaces.
pub fn save_report(report: &ScanReport, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    report.serialize(&mut serializer).wrap_err("failed to serialise report")?;

    let mut file = File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
    file.write_all(&buf)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Report saved.");
    Ok(())
}

/// First address the target resolves to, or "Unknown".
async fn resolve_ip(host: &str) -> String {
    // Bracketed IPv6 literals come out of `Url::host_str` with their brackets.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    match tokio::net::lookup_host((host, 0)).await {
        Ok(mut addrs) => addrs.next().map_or_else(|| "Unknown".to_string(), |a| a.ip().to_string()),
        Err(e) => {
            debug!(host, error = %e, "Could not resolve target address.");
            "Unknown".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_less_input_defaults_to_https() {
        let request = build_request("example.com", ScanFlags::default()).unwrap();
        assert_eq!(request.url.as_str(), "https://example.com/");
        assert_eq!(request.hostname(), "example.com");

        let request = build_request("http://example.com/blog", ScanFlags::default()).unwrap();
        assert_eq!(request.url.as_str(), "http://example.com/blog");
    }

    #[test]
    fn flags_are_carried_into_the_request() {
        let flags = ScanFlags { ssl: true, dns: true, ..ScanFlags::default() };
        let request = build_request("example.com", flags).unwrap();
        assert!(request.ssl && request.dns);
        assert!(!request.cms && !request.headers && !request.cdn && !request.all);
    }

    #[test]
    fn unusable_input_is_a_readable_error() {
        let err = build_request("https://", ScanFlags::default()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid URL 'https://'"));
        assert!(build_request("exa mple.com", ScanFlags::default()).is_err());
    }

    #[test]
    fn saved_report_uses_four_space_indent() {
        let path = std::env::temp_dir().join(format!("fangscan-save-{}.json", std::process::id()));
        save_report(&ScanReport::new("https://example.com/"), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(text, "{\n    \"url\": \"https://example.com/\"\n}");
    }

    #[tokio::test]
    async fn ip_literals_resolve_to_themselves() {
        assert_eq!(resolve_ip("127.0.0.1").await, "127.0.0.1");
        assert_eq!(resolve_ip("[::1]").await, "::1");
    }

    #[tokio::test]
    async fn unresolvable_host_reads_unknown() {
        assert_eq!(resolve_ip("no-such-host.invalid").await, "Unknown");
    }
}
