// src/lib.rs

//! FangScan: web reconnaissance probes (TLS certificate, security headers,
//! technology fingerprints, CDN, DNS) aggregated into one report, shared by
//! the `fangscan` CLI and the `fangscan-api` HTTP server.

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod logging;
pub mod ui;
