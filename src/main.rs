use std::time::Duration;

use dashd::cli::Cli;
use dashd::config::Settings;
use dashd::server::{self, ServeOptions};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_or_usage();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration; a broken config file is diagnosed but not fatal
    let settings = Settings::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });

    dashd::logging::init_with_config(&settings.logging);

    // CLI positionals win over config file and environment
    let ttl_seconds = cli.ttl_seconds.unwrap_or(settings.regen.ttl_seconds);

    let opts = ServeOptions {
        port: cli.port,
        bind: settings.server.bind.clone(),
        dashboard_dir: cli.dashboard_dir,
        regenerator: cli.regenerator,
        ttl: Duration::from_secs(ttl_seconds),
        regen_timeout: Duration::from_secs(settings.regen.timeout_seconds),
    };

    server::run(opts).await?;
    Ok(())
}
