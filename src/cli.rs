use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "keymirror",
    version,
    about = "SSH server that shows clients the public keys they offer"
)]
pub struct Cli {
    /// Path to configuration file (default: keymirror.toml, optional)
    #[arg(short, long, env = "KEYMIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Listen address override (host:port)
    #[arg(long)]
    pub listen: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate configuration and blacklist without starting the server
    CheckConfig,
    /// Print the key report for an authorized_keys-style file
    Inspect {
        /// File with one public key per line
        file: PathBuf,
    },
}
