// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::{error, info};

use fangscan::app::{build_request, App, ScanFlags};
use fangscan::config::ScanConfig;
use fangscan::logging::initialize_logging;
use fangscan::ui::{banner, OutputFormatter, Tone};

/// FangScan - Web Recon Toolkit
#[derive(Debug, Parser)]
#[command(name = "fangscan", version, long_about = None)]
struct Args {
    /// Target URL (with or without https://)
    #[arg(short, long)]
    url: String,

    /// Detect technologies, CMS and JavaScript frameworks
    #[arg(long)]
    cms: bool,

    /// Check security headers
    #[arg(long)]
    headers: bool,

    /// Grab SSL certificate info
    #[arg(long)]
    ssl: bool,

    /// Detect CDN provider and server info
    #[arg(long)]
    cdn: bool,

    /// Enumerate DNS records
    #[arg(long)]
    dns: bool,

    /// Run full scan
    #[arg(long)]
    all: bool,

    /// Save output as JSON
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Disable color output
    #[arg(long)]
    no_color: bool,

    /// Timeout for every network call, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl Args {
    fn flags(&self) -> ScanFlags {
        ScanFlags {
            ssl: self.ssl,
            cms: self.cms,
            headers: self.headers,
            cdn: self.cdn,
            dns: self.dns,
            all: self.all,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = Args::parse();
    initialize_logging(false)?;

    let mut config = ScanConfig::load()?;
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    info!(?config, "Configuration loaded.");

    let formatter = OutputFormatter::new(!args.no_color);
    println!("{}", banner(&formatter));

    let request = match build_request(&args.url, args.flags()) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Rejected scan target.");
            eprintln!("{}", formatter.paint(format!("[!] {e}"), Tone::Red));
            return Ok(ExitCode::from(2));
        }
    };

    let app = App::new(request, config, args.save.clone(), formatter);
    tokio::select! {
        result = app.run() => {
            result?;
            Ok(ExitCode::SUCCESS)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Scan interrupted.");
            println!("\n{}", formatter.paint("[!] Scan aborted by user.", Tone::Red));
            Ok(ExitCode::from(130))
        }
    }
}
