// src/core/mod.rs

/// Typed failures of probes and of whole scan requests.
pub mod error;

/// Contains all data structures used throughout the application,
/// such as `ScanReport`, `ScanRequest`, `HeaderSet` and the per-probe results.
pub mod models;

/// Houses the probes (SSL, headers, DNS, CDN, technology detection) and the
/// orchestrator that assembles them into one report.
pub mod scanner;

/// Static, read-only signature tables: CMS and JS framework signatures,
/// CDN indicators and the security header checklist with remediation advice.
pub mod knowledge_base;
