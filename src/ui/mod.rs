// src/ui/mod.rs

pub mod printer;

pub use self::printer::{OutputFormatter, Tone};

const BANNER: &str = r#"
88P'888'Y88                  888             d8                    888
P'  888  'Y  ,e e,   e88'888 888 ee   dP"Y  d88    ,"Y88b  e88'888 888 ee
    888     d88 88b d888  '8 888 88b C88b  d88888 "8" 888 d888  '8 888 P
    888     888   , Y888   , 888 888  Y88D  888   ,ee 888 Y888   , 888 b
    888      "YeeP"  "88,e8' 888 888 d,dP   888   "88 888  "88,e8' 888 8b"#;

/// The start-up banner with the version line underneath.
pub fn banner(formatter: &OutputFormatter) -> String {
    format!(
        "{}\n{}\n",
        formatter.paint(BANNER, Tone::Cyan),
        formatter.paint(
            format!("                      FangScan v{} - Web Recon Toolkit", env!("CARGO_PKG_VERSION")),
            Tone::Yellow,
        ),
    )
}
