// CLI modules
mod args;
mod op;
mod ops;

use args::Args;
use clap::{Parser, Subcommand};
use hybrid_ecc::http_server::api::v0::{
    ExchangeRequest, KeysRequest, PerformanceRequest, ResetRequest,
};
use op::Op;
use ops::{Daemon, Decrypt, Encrypt, Init, Version};

command_enum! {
    (Init, Init),
    (Daemon, Daemon),
    (Version, Version),
    (Keys, KeysRequest),
    (Exchange, ExchangeRequest),
    (Encrypt, Encrypt),
    (Decrypt, Decrypt),
    (Performance, PerformanceRequest),
    (Reset, ResetRequest),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Build context - always has API client initialized
    let remote = op::resolve_remote(args.remote, args.config_path.clone());
    let ctx = match op::OpContext::new(remote, args.config_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
