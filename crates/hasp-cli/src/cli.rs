//! Command-line surface of the `hasp` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hasp")]
#[command(author, version, about = "Locker bank control over a shared serial bus")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the master orchestrator: scans in, unlock exchanges out
    Master {
        /// Path to the master JSON configuration
        #[arg(long)]
        config: PathBuf,
    },

    /// Run one device node on the bus
    Device {
        /// Path to the device JSON configuration
        #[arg(long)]
        config: PathBuf,
    },

    /// Seal an access token for a locker
    IssueToken {
        /// File holding the raw token key material
        #[arg(long)]
        key_file: PathBuf,

        /// Address of the locker the token unlocks
        #[arg(long)]
        locker: String,

        /// Identity the token is issued to
        #[arg(long)]
        actor: String,

        /// Validity window in seconds, starting now
        #[arg(long, default_value = "900")]
        valid_for: i64,

        /// Explicit window start (RFC 3339), paired with --until
        #[arg(long, requires = "until", conflicts_with = "valid_for")]
        from: Option<String>,

        /// Explicit window end (RFC 3339), paired with --from
        #[arg(long, requires = "from", conflicts_with = "valid_for")]
        until: Option<String>,
    },

    /// Decode a token and show the grant or the rejection category
    DecodeToken {
        /// File holding the raw token key material
        #[arg(long)]
        key_file: PathBuf,

        /// The sealed token to inspect
        token: String,
    },
}
