mod cli;
mod commands;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use safe_proposer::logging::{init_logging, LogConfig};
use safe_proposer::ChainRegistry;
use tokio::runtime::Runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&LogConfig {
        level: cli.log_level,
        format: cli.log_format,
    })?;

    let registry = Arc::new(load_registry(cli.chains.as_deref())?);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Chains => commands::chains(&registry),
            Commands::Estimate {
                safe_address,
                node_url,
                json_file,
            } => commands::estimate(registry, &safe_address, &node_url, &json_file).await,
            Commands::Hash {
                safe_address,
                node_url,
                json_file,
            } => commands::hash(registry, &safe_address, &node_url, &json_file).await,
            Commands::Propose {
                safe_address,
                node_url,
                json_file,
                private_key,
            } => {
                commands::propose(registry, &safe_address, &node_url, &json_file, &private_key)
                    .await
            }
            Commands::EnableModule {
                safe_address,
                node_url,
                module,
                private_key,
            } => {
                commands::enable_module(registry, &safe_address, &node_url, &module, &private_key)
                    .await
            }
        }
    })
}

fn load_registry(chains: Option<&str>) -> Result<ChainRegistry, Box<dyn std::error::Error>> {
    match chains {
        Some(path) => {
            tracing::debug!(path, "loading chain profiles");
            Ok(ChainRegistry::from_path(path)?)
        }
        None => Ok(ChainRegistry::builtin()),
    }
}
