//! Error types for the Safe proposal pipeline.
//!
//! Every pipeline stage returns [`SafeError`]. Configuration problems found
//! while loading chain profiles are reported as [`ConfigError`] and wrapped
//! by [`SafeError::Config`].

use alloy::primitives::Address;

/// Errors produced while preparing, signing or proposing a Safe transaction.
#[derive(Debug, thiserror::Error)]
pub enum SafeError {
    /// No chain profile is registered for this chain id.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(u64),

    /// A raw gas estimate is above the chain's per-transaction ceiling.
    ///
    /// `index` identifies the offending intent when estimating a batch.
    #[error("{}", gas_limit_message(.index, .estimate, .limit))]
    GasLimitExceeded {
        /// Position of the intent in the batch, if any.
        index: Option<usize>,
        /// Raw gas estimate returned by the execution environment.
        estimate: u64,
        /// Configured ceiling.
        limit: u64,
    },

    /// A transaction was built before the wallet was initialized.
    #[error("Safe is not initialized")]
    UninitializedWallet,

    /// A pipeline operation was called out of order.
    #[error("Cannot {operation}: session must be {required}")]
    InvalidSessionState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the session needs to be in.
        required: &'static str,
    },

    /// The signer identity cannot produce signatures.
    #[error("Signing unavailable for watch-only identity {0}")]
    SigningUnavailable(Address),

    /// The signing backend failed to produce a signature.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// The signature does not belong to the transaction being proposed.
    #[error("Signature does not match the transaction hash")]
    SignatureMismatch,

    /// The relay service rejected the proposal or could not be reached.
    #[error("Relay submission failed: {0}")]
    RelaySubmissionFailed(String),

    /// A transaction needs at least one intent.
    #[error("Transaction must contain at least one intent")]
    EmptyTransaction,

    /// The execution environment (RPC node) failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Malformed caller input (addresses, hex payloads, keys).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Chain profile configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn gas_limit_message(index: &Option<usize>, estimate: &u64, limit: &u64) -> String {
    match index {
        Some(i) => format!(
            "Gas estimate for transaction {i} exceeds maxGasPerTx: {estimate} > {limit}"
        ),
        None => format!("Gas estimate exceeds maxGasPerTx: {estimate} > {limit}"),
    }
}

/// Errors found while loading or validating chain profiles.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Refund fraction outside `[0, 1)`.
    #[error("Refund fraction must be in [0, 1), got {0}")]
    InvalidRefundFraction(String),

    /// Per-transaction gas ceiling of zero.
    #[error("maxGasPerTx must be positive for chain {0}")]
    InvalidGasLimit(u64),

    /// Relay endpoint is not a valid URL.
    #[error("Invalid relay URL {url}: {reason}")]
    InvalidRelayUrl {
        /// The configured value.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Reading the profile file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The profile file is not valid JSON.
    #[error("Failed to parse chain profiles: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SafeError> = std::result::Result<T, E>;
