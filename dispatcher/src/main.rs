//! Faucet dispatcher
//!
//! ```sh
//! faucet-dispatcher init            # Generate default config.toml
//! faucet-dispatcher serve           # Bootstrap chains and hold the registry
//! ```

use clap::Parser;
use faucet_dispatcher::cmd::{self, Cli, Commands};

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { output, force } => cmd::init::run(&output, force),
        Commands::Serve { config } => cmd::serve::run(&config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
