// src/core/scanner/dns_scanner.rs

use tracing::{debug, info, warn};

use crate::core::models::DnsRecords;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;

/// Builds the resolver used by every DNS-based probe of a scan.
///
/// Uses the system configuration when it can be read and the library
/// defaults otherwise; the query timeout and attempts come from the config.
pub fn build_resolver(timeout: Duration, attempts: usize) -> TokioAsyncResolver {
    let (config, mut opts) = read_system_conf().unwrap_or_else(|e| {
        debug!(error = %e, "System resolver config unavailable, using defaults.");
        (ResolverConfig::default(), ResolverOpts::default())
    });
    opts.timeout = timeout;
    opts.attempts = attempts;
    TokioAsyncResolver::tokio(config, opts)
}

/// Enumerates the A and MX records of `target`.
///
/// Each record type is resolved independently; NXDOMAIN, timeouts and empty
/// answers all collapse into an empty list for that type, so the result
/// cannot tell "no records" apart from "lookup failed".
pub async fn run_dns_scan(resolver: &TokioAsyncResolver, target: &str) -> DnsRecords {
    info!(target, "Starting DNS scan.");

    let (a, mx) = tokio::join!(lookup_a(resolver, target), lookup_mx(resolver, target));

    info!(a = a.len(), mx = mx.len(), "DNS scan finished.");
    DnsRecords { a, mx }
}

async fn lookup_a(resolver: &TokioAsyncResolver, target: &str) -> Vec<String> {
    debug!(target, "Looking up A records.");
    match resolver.ipv4_lookup(target).await {
        Ok(records) => records.iter().map(|a| a.to_string()).collect(),
        Err(e) => {
            warn!(target, error = %e, "A lookup failed.");
            Vec::new()
        }
    }
}

/// MX exchanges only; preferences are dropped.
async fn lookup_mx(resolver: &TokioAsyncResolver, target: &str) -> Vec<String> {
    debug!(target, "Looking up MX records.");
    match resolver.mx_lookup(target).await {
        Ok(records) => records.iter().map(|mx| mx.exchange().to_string()).collect(),
        Err(e) => {
            warn!(target, error = %e, "MX lookup failed.");
            Vec::new()
        }
    }
}

/// Best-effort CNAME lookup. Any failure yields an empty list.
pub async fn lookup_cname(resolver: &TokioAsyncResolver, target: &str) -> Vec<String> {
    debug!(target, "Looking up CNAME records.");
    match resolver.lookup(target, RecordType::CNAME).await {
        Ok(lookup) => lookup
            .iter()
            .filter(|rdata| matches!(rdata, RData::CNAME(_)))
            .map(|rdata| rdata.to_string())
            .collect(),
        Err(e) => {
            debug!(target, error = %e, "No CNAME record.");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // An empty list here cannot distinguish NXDOMAIN from a resolver outage.
    #[tokio::test]
    async fn missing_domain_yields_empty_lists() {
        let resolver = build_resolver(Duration::from_secs(1), 1);
        let records = run_dns_scan(&resolver, "nothing-here.invalid").await;
        assert_eq!(records, DnsRecords { a: Vec::new(), mx: Vec::new() });
    }

    // The resolver answers loopback names itself: A is 127.0.0.1, MX has no records.
    #[tokio::test]
    async fn host_without_mail_exchanger_has_a_records_and_empty_mx() {
        let resolver = build_resolver(Duration::from_secs(1), 1);
        let records = run_dns_scan(&resolver, "localhost.").await;
        assert_eq!(records.a, vec!["127.0.0.1".to_string()]);
        assert!(records.mx.is_empty());
    }

    #[tokio::test]
    async fn missing_cname_is_absorbed() {
        let resolver = build_resolver(Duration::from_secs(1), 1);
        assert!(lookup_cname(&resolver, "nothing-here.invalid").await.is_empty());
    }

    #[test]
    fn serialises_with_record_type_keys() {
        let records = DnsRecords { a: vec!["93.184.216.34".into()], mx: Vec::new() };
        assert_eq!(
            serde_json::to_value(records).unwrap(),
            serde_json::json!({"A": ["93.184.216.34"], "MX": []})
        );
    }
}
