//! `hasp` binary entry point.
//!
//! # Usage
//!
//! ```bash
//! # Run the master over /dev/ttyUSB0
//! hasp master --config /etc/hasp/master.json
//!
//! # Run a device node
//! hasp device --config /etc/hasp/device.json
//!
//! # Issue a token valid for the next 15 minutes
//! hasp issue-token --key-file /etc/hasp/key --locker A1 --actor alice
//!
//! # Inspect a token
//! hasp decode-token --key-file /etc/hasp/key <token>
//! ```
//!
//! Log verbosity follows `RUST_LOG`, defaulting to `info`.

mod cli;
mod device;
mod master;
mod token;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Master { config } => master::run(&config).await,
        Commands::Device { config } => device::run(&config).await,
        Commands::IssueToken {
            key_file,
            locker,
            actor,
            valid_for,
            from,
            until,
        } => token::issue(&key_file, &locker, &actor, valid_for, from, until),
        Commands::DecodeToken { key_file, token } => token::decode(&key_file, &token),
    }
}

/// A shutdown receiver that flips to `true` on Ctrl-C.
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = tx.send(true);
        }
    });
    rx
}
