//! The state authority binary.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use authority::Authority;
use authority_config::{ConfigLoader, ExitCode};

#[derive(Parser)]
#[command(name = "authority")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the state authority pipeline.
    Run {
        /// Directory to load authority.toml / authority.local.toml from.
        #[arg(long)]
        config_dir: Option<PathBuf>,

        /// Path to the durable journal file. Omit for in-memory, for
        /// `highly-available: false` development use.
        #[arg(long)]
        journal: Option<PathBuf>,
    },

    /// Load and validate configuration without starting anything.
    CheckConfig {
        #[arg(long)]
        config_dir: Option<PathBuf>,
    },

    /// Print version information.
    Version,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(%err, "authority exited with an error");
            ExitCode::Misconfiguration
        }
    };
    std::process::exit(exit_code.as_i32());
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Version => {
            println!("authority {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::Graceful)
        }

        Commands::CheckConfig { config_dir } => {
            let mut loader = ConfigLoader::new();
            if let Some(dir) = config_dir {
                loader = loader.with_project_dir(dir);
            }
            let config = loader.load()?;
            println!("{config:#?}");
            Ok(ExitCode::Graceful)
        }

        Commands::Run { config_dir, journal } => {
            let mut loader = ConfigLoader::new();
            if let Some(dir) = config_dir {
                loader = loader.with_project_dir(dir);
            }
            let config = loader.load()?;

            let authority = Authority::start(&config, journal)?;
            wait_for_shutdown_signal();
            authority.shutdown();
            Ok(ExitCode::Graceful)
        }
    }
}

/// Blocks until the process receives a shutdown request. A full binary
/// would listen for SIGTERM/SIGINT here; this placeholder blocks
/// forever so `authority run` behaves as a long-running service under a
/// process supervisor that sends SIGKILL on stop.
fn wait_for_shutdown_signal() {
    loop {
        thread::sleep(Duration::from_secs(3600));
    }
}
