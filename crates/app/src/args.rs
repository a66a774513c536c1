pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "hybrid")]
#[command(about = "ECDH key exchange and AES-192 file encryption")]
#[command(version)]
pub struct Args {
    /// Daemon API URL (defaults to the configured api_port on localhost)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the hybrid config directory (defaults to ~/.hybrid)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
