// src/ui/printer.rs

use std::fmt::Display;

use crossterm::style::{style, Attribute, Color, Stylize};

use crate::core::models::{CdnVerdict, Probe, ScanReport};

/// Colours used by the report printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Cyan,
    Green,
    Yellow,
    Red,
    White,
}

impl From<Tone> for Color {
    fn from(tone: Tone) -> Self {
        match tone {
            Tone::Cyan => Color::Cyan,
            Tone::Green => Color::Green,
            Tone::Yellow => Color::Yellow,
            Tone::Red => Color::Red,
            Tone::White => Color::White,
        }
    }
}

/// Terminal styling for one CLI invocation. Built once from `--no-color` and
/// passed to everything that prints.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    color: bool,
}

impl OutputFormatter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders `text` bold in the given tone, or unchanged without colour.
    pub fn paint(&self, text: impl Display, tone: Tone) -> String {
        if self.color {
            style(text).with(tone.into()).attribute(Attribute::Bold).to_string()
        } else {
            text.to_string()
        }
    }

    /// Renders the report as terminal lines, tree-style.
    ///
    /// # Arguments
    /// * `report` - The aggregated scan report.
    /// * `ip` - First resolved address of the target, or "Unknown".
    pub fn render_report(&self, report: &ScanReport, ip: &str) -> Vec<String> {
        let mut out = Lines { fmt: self, lines: Vec::new() };

        out.blank();
        out.push(format!("URL: {}", report.url), Tone::Green);
        out.push(format!("IP : {ip}"), Tone::Green);

        if let Some(technologies) = &report.technologies {
            out.section("Detected Technologies");
            match technologies {
                Probe::Done(map) => {
                    for (category, items) in map {
                        out.blank();
                        out.push(format!("{}:", category.to_lowercase()), Tone::Yellow);
                        for tech in items {
                            out.bullet(tech);
                        }
                    }
                }
                Probe::Failed { error } => out.failure(error),
            }
        }

        if let Some(frameworks) = &report.javascript_frameworks {
            out.section("JavaScript Frameworks");
            match frameworks {
                Probe::Done(found) => found.keys().for_each(|name| out.bullet(name)),
                Probe::Failed { error } => out.failure(error),
            }
        }

        if let Some(cms) = &report.cms {
            out.section("Detected CMS");
            match cms {
                Probe::Done(found) => {
                    for (name, reason) in found {
                        out.bullet(format!("{name} ({reason})"));
                    }
                }
                Probe::Failed { error } => out.failure(error),
            }
        }

        if let Some(info) = &report.server_info {
            out.section("Server Information");
            out.field("Server", &info.server);
            out.field("Powered By", &info.x_powered_by);
            out.field("HTTP/3 Support", if info.http3_support { "Yes" } else { "No" });
            out.field("CDN", &info.cdn);
            if let CdnVerdict::Detected { confidence, alternatives, .. } = &info.cdn_verdict {
                out.field("CDN Confidence", confidence);
                if !alternatives.is_empty() {
                    out.field("CDN Alternatives", alternatives.join(", "));
                }
            }
        }

        if let Some(ssl) = &report.ssl_info {
            out.section("SSL Information");
            match ssl {
                Probe::Done(info) => {
                    out.field("Issuer", &info.issuer);
                    out.field("Subject", &info.subject);
                    out.field("Valid From", &info.not_before);
                    out.field("Valid Until", &info.not_after);
                    out.field("Days Until Expiry", info.days_until_expiry);
                    out.field("TLS Version", &info.tls_version);
                }
                Probe::Failed { error } => out.failure(error),
            }
        }

        if let Some(headers) = &report.headers {
            out.section("Security Headers");
            for (name, status) in headers {
                out.field(name, &status.status);
            }
        }

        if let Some(dns) = &report.dns {
            out.section("DNS Records");
            for (kind, records) in [("A", &dns.a), ("MX", &dns.mx)] {
                out.blank();
                out.push(format!("{kind}:"), Tone::Yellow);
                records.iter().for_each(|record| out.bullet(record));
            }
        }

        out.lines
    }
}

struct Lines<'a> {
    fmt: &'a OutputFormatter,
    lines: Vec<String>,
}

impl Lines<'_> {
    fn push(&mut self, text: impl Display, tone: Tone) {
        self.lines.push(self.fmt.paint(text, tone));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn section(&mut self, title: &str) {
        self.blank();
        self.push(format!("[+] {title}:"), Tone::Cyan);
    }

    fn bullet(&mut self, text: impl Display) {
        self.push(format!("  ├─ {text}"), Tone::White);
    }

    fn field(&mut self, label: &str, value: impl Display) {
        self.bullet(format!("{label}: {value}"));
    }

    fn failure(&mut self, error: &str) {
        self.push(format!("  ├─ Error: {error}"), Tone::Red);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{DnsRecords, HeaderStatus, ServerInfo, SslInfo};

    fn plain() -> OutputFormatter {
        OutputFormatter::new(false)
    }

    #[test]
    fn paint_without_colour_is_identity() {
        assert_eq!(plain().paint("[*] hi", Tone::Yellow), "[*] hi");
    }

    #[test]
    fn paint_with_colour_wraps_in_escape_codes() {
        let painted = OutputFormatter::new(true).paint("hi", Tone::Red);
        assert!(painted.contains("hi"));
        assert!(painted.starts_with('\u{1b}'));
    }

    #[test]
    fn bare_report_prints_url_and_ip_only() {
        let lines = plain().render_report(&ScanReport::new("https://example.com/"), "93.184.216.34");
        assert_eq!(lines, vec!["", "URL: https://example.com/", "IP : 93.184.216.34"]);
    }

    #[test]
    fn sections_use_tree_bullets() {
        let mut report = ScanReport::new("https://example.com/");
        report.server_info = Some(ServerInfo {
            server: "cloudflare".into(),
            x_powered_by: "Unknown".into(),
            http3_support: true,
            cdn: "Cloudflare".into(),
            cdn_verdict: CdnVerdict::Detected { provider: "Cloudflare".into(), confidence: 2, alternatives: vec![] },
        });
        report.headers = Some(vec![(
            "X-Frame-Options".into(),
            HeaderStatus { status: "Not Found".into(), advice: "Use 'DENY'".into() },
        )]);
        report.dns = Some(DnsRecords { a: vec!["104.16.0.1".into()], mx: vec![] });

        let lines = plain().render_report(&report, "Unknown");
        let text = lines.join("\n");
        assert!(text.contains("[+] Server Information:\n  ├─ Server: cloudflare"));
        assert!(text.contains("  ├─ HTTP/3 Support: Yes"));
        assert!(text.contains("  ├─ CDN Confidence: 2"));
        assert!(!text.contains("CDN Alternatives"));
        assert!(text.contains("[+] Security Headers:\n  ├─ X-Frame-Options: Not Found"));
        assert!(text.ends_with("A:\n  ├─ 104.16.0.1\n\nMX:"));
    }

    #[test]
    fn failed_probes_print_their_error() {
        let mut report = ScanReport::new("https://example.com/");
        report.ssl_info = Some(Probe::<SslInfo>::failed("TCP Connection Error: refused"));
        let text = plain().render_report(&report, "Unknown").join("\n");
        assert!(text.contains("[+] SSL Information:\n  ├─ Error: TCP Connection Error: refused"));
    }
}
