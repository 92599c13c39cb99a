// src/core/scanner/cdn_scanner.rs

use tracing::{debug, info};

use crate::core::knowledge_base::{Signature, CDN_INDICATORS};
use crate::core::models::{CdnVerdict, HeaderSet, ServerInfo};
use crate::core::scanner::dns_scanner::lookup_cname;
use hickory_resolver::TokioAsyncResolver;

/// Identifies the CDN in front of `target`.
///
/// Headers are scored first, then the host's CNAME targets; a failed header
/// fetch (`None`) only skips the first phase.
pub async fn run_cdn_scan(
    headers: Option<&HeaderSet>,
    resolver: &TokioAsyncResolver,
    target: &str,
) -> CdnVerdict {
    info!(target, "Starting CDN detection.");
    let cnames = lookup_cname(resolver, target).await;
    let verdict = classify_cdn(headers, &cnames);
    info!(cdn = verdict.provider(), "CDN detection finished.");
    verdict
}

/// Scores every known CDN and picks the best one.
///
/// Each indicator found in a lowercased `name:value` header pair or CNAME
/// target adds one point. Repeated headers form a single pair. Ties keep the order in which providers first
/// scored, header matches before CNAME matches.
pub fn classify_cdn(headers: Option<&HeaderSet>, cnames: &[String]) -> CdnVerdict {
    let mut scores: Vec<(&'static str, usize)> = Vec::new();

    if let Some(headers) = headers {
        let pairs: Vec<String> = headers
            .merged()
            .map(|(name, value)| format!("{name}:{value}").to_lowercase())
            .collect();
        for cdn in CDN_INDICATORS {
            for haystack in &pairs {
                add_hits(&mut scores, cdn, haystack);
            }
        }
    }

    for cname in cnames {
        let haystack = cname.to_lowercase();
        for cdn in CDN_INDICATORS {
            add_hits(&mut scores, cdn, &haystack);
        }
    }

    if scores.is_empty() {
        return CdnVerdict::Unknown;
    }

    // Stable: equal scores keep insertion order.
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    let (provider, confidence) = scores[0];
    CdnVerdict::Detected {
        provider: provider.to_string(),
        confidence,
        alternatives: scores[1..].iter().map(|(name, _)| name.to_string()).collect(),
    }
}

fn add_hits(scores: &mut Vec<(&'static str, usize)>, cdn: &Signature, haystack: &str) {
    let hits = cdn.patterns.iter().filter(|p| haystack.contains(*p)).count();
    if hits == 0 {
        return;
    }
    debug!(cdn = cdn.name, hits, haystack, "CDN indicator matched.");
    match scores.iter_mut().find(|(name, _)| *name == cdn.name) {
        Some((_, score)) => *score += hits,
        None => scores.push((cdn.name, hits)),
    }
}

/// Summarises the server identity of the target from its response headers.
///
/// Missing headers (or a failed fetch) read as "Unknown".
pub fn server_info(headers: Option<&HeaderSet>, cdn: CdnVerdict) -> ServerInfo {
    let header = |name: &str| {
        headers
            .and_then(|h| h.get(name))
            .unwrap_or("Unknown")
            .to_string()
    };
    ServerInfo {
        server: header("Server"),
        x_powered_by: header("X-Powered-By"),
        http3_support: headers.is_some_and(|h| h.contains("Alt-Svc")),
        cdn: cdn.provider().to_string(),
        cdn_verdict: cdn,
    }
}
