// src/core/models.rs

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::error::ProbeError;

// --- Reusable Result Types ---

/// Outcome of a single probe.
///
/// A failed probe never aborts the scan: it is kept in the report and
/// serialises as `{"error": "<message>"}` next to the other sections.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Probe<T> {
    Failed { error: String },
    Done(T),
}

impl<T> Probe<T> {
    pub fn failed(error: impl ToString) -> Self {
        Probe::Failed { error: error.to_string() }
    }

    pub fn as_done(&self) -> Option<&T> {
        match self {
            Probe::Done(value) => Some(value),
            Probe::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Probe::Failed { error } => Some(error),
            Probe::Done(_) => None,
        }
    }
}

impl<T> From<Result<T, ProbeError>> for Probe<T> {
    fn from(result: Result<T, ProbeError>) -> Self {
        match result {
            Ok(value) => Probe::Done(value),
            Err(e) => Probe::failed(e),
        }
    }
}

// --- Scan Request ---

/// The validated input of one scan: an absolute http(s) URL and the
/// requested scan types. `all` overrides every other flag.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub url: url::Url,
    pub ssl: bool,
    pub cms: bool,
    pub headers: bool,
    pub cdn: bool,
    pub dns: bool,
    pub all: bool,
}

impl ScanRequest {
    /// Host name the network probes talk to (no scheme, no port).
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

// --- HTTP Headers ---

/// Response headers of the target, looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    headers: HeaderMap,
}

impl HeaderSet {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Builds a header set from name/value pairs, skipping invalid entries.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(name.as_bytes()),
                reqwest::header::HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        Self { headers }
    }

    /// First value of a header. Non-UTF-8 values are replaced by a marker.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap_or("[Invalid UTF-8]"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Every `(name, value)` entry, repeated headers included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
    }

    /// One `(name, value)` entry per header name; repeated values are joined
    /// with `", "`.
    pub fn merged(&self) -> impl Iterator<Item = (&str, String)> {
        self.headers.keys().map(|name| {
            let values: Vec<&str> = self
                .headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            (name.as_str(), values.join(", "))
        })
    }
}

// --- SSL/TLS Models ---

/// Certificate and handshake details of the target's TLS endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SslInfo {
    pub issuer: String,
    pub subject: String,
    #[serde(rename = "notBefore")]
    pub not_before: String,
    #[serde(rename = "notAfter")]
    pub not_after: String,
    pub days_until_expiry: i64,
    pub tls_version: String,
}

// --- DNS Models ---

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DnsRecords {
    #[serde(rename = "A")]
    pub a: Vec<String>,
    #[serde(rename = "MX")]
    pub mx: Vec<String>,
}

// --- CDN Models ---

/// Result of CDN classification. Serialises as the bare string `"Unknown"`
/// when no provider matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdnVerdict {
    Unknown,
    Detected {
        provider: String,
        confidence: usize,
        alternatives: Vec<String>,
    },
}

impl CdnVerdict {
    pub fn provider(&self) -> &str {
        match self {
            CdnVerdict::Unknown => "Unknown",
            CdnVerdict::Detected { provider, .. } => provider,
        }
    }
}

impl Serialize for CdnVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CdnVerdict::Unknown => serializer.serialize_str("Unknown"),
            CdnVerdict::Detected { provider, confidence, alternatives } => {
                let mut state = serializer.serialize_struct("CdnVerdict", 3)?;
                state.serialize_field("detected", provider)?;
                state.serialize_field("confidence", confidence)?;
                state.serialize_field("alternatives", alternatives)?;
                state.end()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub server: String,
    pub x_powered_by: String,
    pub http3_support: bool,
    pub cdn: String,
    pub cdn_verdict: CdnVerdict,
}

// --- Security Header Models ---

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HeaderStatus {
    pub status: String,
    pub advice: String,
}

/// Checklist header name -> status, in checklist order.
pub type SecurityHeaderReport = Vec<(String, HeaderStatus)>;

// --- Technology Models ---

/// BuiltWith-style category key -> technology names.
pub type TechnologyMap = BTreeMap<String, Vec<String>>;

/// Technology name -> reason it was reported.
pub type SignatureMatches = BTreeMap<String, String>;

// --- Main Report ---

/// The aggregated report of one scan. Every section except `url` is present
/// only when its scan type was requested.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_info: Option<Probe<SslInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Probe<TechnologyMap>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cms: Option<Probe<SignatureMatches>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javascript_frameworks: Option<Probe<SignatureMatches>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<ServerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsRecords>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_security_headers"
    )]
    pub headers: Option<SecurityHeaderReport>,
}

impl ScanReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ssl_info: None,
            technologies: None,
            cms: None,
            javascript_frameworks: None,
            server_info: None,
            dns: None,
            headers: None,
        }
    }
}

// Keeps the checklist order in the JSON object.
fn serialize_security_headers<S: Serializer>(
    report: &Option<SecurityHeaderReport>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    match report {
        Some(entries) => {
            let mut map = serializer.serialize_map(Some(entries.len()))?;
            for (name, status) in entries {
                map.serialize_entry(name, status)?;
            }
            map.end()
        }
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_probe_serialises_as_error_object() {
        let probe: Probe<SslInfo> = Probe::failed("connection refused");
        assert_eq!(serde_json::to_value(&probe).unwrap(), json!({"error": "connection refused"}));
    }

    #[test]
    fn unknown_cdn_is_a_bare_string() {
        assert_eq!(serde_json::to_value(CdnVerdict::Unknown).unwrap(), json!("Unknown"));
    }

    #[test]
    fn detected_cdn_carries_confidence_and_alternatives() {
        let verdict = CdnVerdict::Detected {
            provider: "Fastly".into(),
            confidence: 2,
            alternatives: vec!["Varnish".into()],
        };
        assert_eq!(
            serde_json::to_value(verdict).unwrap(),
            json!({"detected": "Fastly", "confidence": 2, "alternatives": ["Varnish"]})
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let headers = HeaderSet::from_pairs([("Strict-Transport-Security", "max-age=1")]);
        assert_eq!(headers.get("strict-transport-security"), Some("max-age=1"));
        assert!(headers.contains("STRICT-TRANSPORT-SECURITY"));
    }

    #[test]
    fn merged_joins_repeated_headers() {
        let headers = HeaderSet::from_pairs([("Set-Cookie", "a=1"), ("Server", "nginx"), ("Set-Cookie", "b=2")]);
        let merged: Vec<(&str, String)> = headers.merged().collect();
        assert_eq!(merged, vec![("set-cookie", "a=1, b=2".to_string()), ("server", "nginx".to_string())]);
    }

    #[test]
    fn security_headers_keep_checklist_order() {
        let mut report = ScanReport::new("https://example.com/");
        report.headers = Some(vec![
            ("X-Frame-Options".into(), HeaderStatus { status: "Not Found".into(), advice: "a".into() }),
            ("Content-Security-Policy".into(), HeaderStatus { status: "Not Found".into(), advice: "b".into() }),
        ]);
        let text = serde_json::to_string(&report).unwrap();
        assert!(text.find("X-Frame-Options").unwrap() < text.find("Content-Security-Policy").unwrap());
    }
}
