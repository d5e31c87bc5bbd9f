//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Static dashboard server with TTL-gated lazy data regeneration.
#[derive(Parser, Debug)]
#[command(name = "dashd", version, styles = clap_cargo_style())]
#[command(about = "Serve a dashboard directory, regenerating stale data files on demand")]
pub struct Cli {
    /// TCP port to bind
    pub port: u16,

    /// Directory served as the web root; also the working directory for
    /// the server and the regenerator
    pub dashboard_dir: PathBuf,

    /// Regenerator command, invoked as `<regenerator> dashboard generate`
    pub regenerator: PathBuf,

    /// Seconds generated data stays fresh before a request triggers
    /// regeneration [default: 5]
    pub ttl_seconds: Option<u64>,

    /// Path to a custom dashd.toml
    #[arg(short, long, env = "DASHD_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse arguments, exiting 1 with a usage message on stderr when they
    /// are malformed. Help and version requests still exit 0.
    pub fn parse_or_usage() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = e.print();
                std::process::exit(0);
            }
            Err(e) => {
                let _ = e.print();
                std::process::exit(1);
            }
        }
    }
}
