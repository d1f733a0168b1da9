//! Prepare, gas-estimate, sign and propose Safe multisig transactions.
//!
//! The pipeline is driven by [`MultisigOrchestrator`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use alloy::primitives::{Address, Bytes, U256};
//! use alloy::providers::ProviderBuilder;
//! use safe_proposer::{ChainRegistry, MultisigOrchestrator, RpcEnvironment, SignerIdentity, TransactionIntent};
//!
//! let provider = ProviderBuilder::new().on_builtin("https://eth.llamarpc.com").await?;
//! let mut safe = MultisigOrchestrator::new(RpcEnvironment::new(provider), Arc::new(ChainRegistry::builtin()));
//!
//! let owner = SignerIdentity::from_private_key("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef")?;
//! safe.initialize(owner, "0x1234567890123456789012345678901234567890".parse()?).await?;
//!
//! let intent = TransactionIntent::call(Address::ZERO, U256::ZERO, Bytes::new());
//! let tx = safe.create_transaction(&[intent]).await?;
//! let signed = safe.sign_transaction(&tx).await?;
//! safe.propose_transaction(&tx, &signed).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod chains;
pub mod contracts;
pub mod environment;
pub mod error;
pub mod gas;
pub mod logging;
pub mod orchestrator;
pub mod proposal;
pub mod signer;
pub mod types;
pub mod utils;

pub use builder::{Operation, SafeCall, UnsignedTransaction};
pub use chains::{ChainProfile, ChainRegistry};
pub use environment::{ExecutionEnvironment, RpcEnvironment};
pub use error::{ConfigError, SafeError};
pub use gas::{AggregateGasEstimate, GasEstimate, RefundFraction, BATCH_REFUND_FRACTION};
pub use orchestrator::{MultisigOrchestrator, SessionState};
pub use proposal::{ProposalClient, ProposalStatus};
pub use signer::{Signature, SignedTransaction, SignerIdentity, SignerSession, TransactionHash};
pub use types::TransactionIntent;
