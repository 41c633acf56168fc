//! BridgeWarden CLI - guard local files and inspect policy state

use anyhow::Context;
use bridgewarden_core::{load_config, WardenContext, POLICY_VERSION};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bridgewarden")]
#[command(about = "BridgeWarden - Content guard between agents and untrusted sources")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Guard a local file and print the result as JSON
    Scan {
        /// File to scan
        path: PathBuf,
        /// Policy profile (permissive, balanced, strict)
        #[arg(short, long)]
        profile: Option<String>,
        /// Data directory for quarantine, approvals, and audit logs
        #[arg(long, default_value = ".bridgewarden")]
        data_dir: PathBuf,
        /// Configuration file path
        #[arg(short, long, default_value = "bridgewarden.yaml")]
        config: PathBuf,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "bridgewarden.yaml")]
        config: PathBuf,
    },
    /// Show policy version and active profile
    Status {
        /// Configuration file path
        #[arg(short, long, default_value = "bridgewarden.yaml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    match cli.command {
        Some(Commands::Scan { path, profile, data_dir, config }) => {
            let config = load_config(&config)?;
            let context = WardenContext::new(&data_dir, config)?;
            let base_dir = std::env::current_dir().context("cannot resolve working directory")?;
            let mut handlers = context.handlers(&base_dir);
            if let Some(profile) = profile {
                handlers = handlers.with_profile(profile);
            }
            let result = handlers.read_file(&path.to_string_lossy(), None, "safe")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Commands::Check { config }) => {
            let parsed = load_config(&config)?;
            println!("config OK: profile={}", parsed.profile);
        }
        Some(Commands::Status { config }) => {
            let parsed = load_config(&config)?;
            println!(
                "BridgeWarden policy {} - profile {} - network {}",
                POLICY_VERSION,
                parsed.profile,
                if parsed.network.enabled { "enabled" } else { "disabled" }
            );
        }
        None => {
            println!("BridgeWarden v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
