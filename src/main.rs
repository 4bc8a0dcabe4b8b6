use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use keymirror::cli::{Cli, Command};
use keymirror::config;
use keymirror::config::types::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config: file (or defaults) → env vars → CLI flags
    let (config_path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_PATH), false),
    };
    let mut app_config = config::resolve_config(&config_path, explicit)?;
    if let Some(listen) = &cli.listen {
        app_config.server.listen = listen.clone();
        config::validate_config(&app_config)?;
    }

    match &cli.command {
        Some(Command::CheckConfig) => return check_config(&app_config),
        Some(Command::Inspect { file }) => return inspect(&app_config, file),
        None => {}
    }

    // Setup logging (CLI override > config)
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| app_config.logging.level.to_string());
    keymirror::logging::setup_logging(&log_level, app_config.logging.format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %app_config.server.listen,
        "Starting keymirror"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        if let Err(e) = keymirror::server::run(app_config).await {
            error!(error = %e, "Server error");
            std::process::exit(1);
        }
    });

    Ok(())
}

fn check_config(app_config: &AppConfig) -> Result<()> {
    let blacklist = keymirror::server::load_blacklist(app_config)?;
    println!("Configuration is valid.");
    println!("  Listen: {}", app_config.server.listen);
    println!(
        "  Request timeout: {}s",
        app_config.server.request_timeout_secs
    );
    println!("  Blacklist entries: {}", blacklist.len());
    Ok(())
}

fn inspect(app_config: &AppConfig, file: &std::path::Path) -> Result<()> {
    use anyhow::Context;

    let blacklist = keymirror::server::load_blacklist(app_config)?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading key file: {}", file.display()))?;
    let inspection = keymirror::inspect::inspect_text(&text, &blacklist);
    for (line, err) in &inspection.skipped {
        eprintln!("{}:{}: skipped: {}", file.display(), line, err);
    }
    print!("{}", inspection.report.render_table().replace("\r\n", "\n"));
    for fingerprint in &inspection.report.blacklisted {
        println!("WARNING: key {} is blacklisted", fingerprint);
    }
    Ok(())
}
