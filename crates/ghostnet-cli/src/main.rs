//! GhostNet node binary.
//!
//! # Usage
//!
//! ```bash
//! ghostnet --identity alice create --name "Cipher Club"
//! ghostnet --identity bob join --id 1
//! ghostnet --identity bob send --id 1 --message "hello"
//! ghostnet --identity alice read --id 1
//! ```

use std::path::PathBuf;

use clap::Parser;
use ghostnet_cli::{Command, Node};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// GhostNet node
#[derive(Parser, Debug)]
#[command(name = "ghostnet")]
#[command(about = "Encrypted group rooms over a local GhostNet ledger")]
#[command(version)]
struct Args {
    /// Directory holding the ledger database and coprocessor key
    #[arg(short, long, default_value = ".ghostnet")]
    data_dir: PathBuf,

    /// Development identity to act as
    #[arg(short, long, default_value = "alice")]
    identity: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[allow(clippy::print_stdout)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut node = Node::open(&args.data_dir)?;
    let output = node.execute(&args.identity, args.command)?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
