use clap::{Parser, Subcommand};
use safe_proposer::logging::{LogFormat, LogLevel};

#[derive(Parser)]
#[command(name = "safe-proposer")]
#[command(about = "Estimate, sign and propose Safe transactions to the Safe Transaction Service")]
#[command(version)]
pub struct Cli {
    /// JSON file with extra or overriding chain profiles
    #[arg(long, global = true, env = "SAFE_PROPOSER_CHAINS")]
    pub chains: Option<String>,
    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the configured chain profiles
    #[command(name = "chains")]
    Chains,
    /// Estimate safeTxGas for the transactions in a JSON file
    #[command(name = "estimate")]
    Estimate {
        /// Safe address
        safe_address: String,
        /// Ethereum RPC node URL
        node_url: String,
        /// Path to JSON transaction file (object or array)
        json_file: String,
    },
    /// Build a transaction and print its Safe transaction hash without signing
    #[command(name = "hash")]
    Hash {
        /// Safe address
        safe_address: String,
        /// Ethereum RPC node URL
        node_url: String,
        /// Path to JSON transaction file (object or array)
        json_file: String,
    },
    /// Estimate, sign and propose the transactions in a JSON file
    #[command(name = "propose")]
    Propose {
        /// Safe address
        safe_address: String,
        /// Ethereum RPC node URL
        node_url: String,
        /// Path to JSON transaction file (object or array)
        json_file: String,
        /// Owner private key (hex, with or without 0x)
        #[arg(long, env = "SAFE_PROPOSER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// Propose a transaction that enables a module on the Safe
    #[command(name = "enable-module")]
    EnableModule {
        /// Safe address
        safe_address: String,
        /// Ethereum RPC node URL
        node_url: String,
        /// Module contract address
        module: String,
        /// Owner private key (hex, with or without 0x)
        #[arg(long, env = "SAFE_PROPOSER_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
}
