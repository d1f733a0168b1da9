//! Access to chain state: chain id, gas simulation and the Safe nonce.

use std::future::Future;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::TransactionRequest;
use alloy_sol_types::SolCall;

use crate::contracts::GnosisSafe;
use crate::error::{Result, SafeError};
use crate::types::TransactionIntent;

/// Read-only view of the chain the Safe lives on.
///
/// Every method is a pure read, so calls may run concurrently.
pub trait ExecutionEnvironment {
    /// Chain id reported by the node.
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Gas units needed to execute `intent` when sent from `from`.
    fn simulate_call(
        &self,
        from: Address,
        intent: &TransactionIntent,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Current nonce of the Safe at `wallet`.
    fn safe_nonce(&self, wallet: Address) -> impl Future<Output = Result<U256>> + Send;
}

/// [`ExecutionEnvironment`] backed by an alloy provider.
#[derive(Debug, Clone)]
pub struct RpcEnvironment<P> {
    provider: P,
}

impl<P: Provider> RpcEnvironment<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> ExecutionEnvironment for RpcEnvironment<P> {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| SafeError::Rpc(format!("eth_chainId: {e}")))
    }

    async fn simulate_call(&self, from: Address, intent: &TransactionIntent) -> Result<u64> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(intent.to)
            .with_value(intent.value)
            .with_input(intent.data.clone());

        self.provider
            .estimate_gas(&tx)
            .await
            .map_err(|e| SafeError::Rpc(format!("eth_estimateGas to {}: {e}", intent.to)))
    }

    async fn safe_nonce(&self, wallet: Address) -> Result<U256> {
        let tx = TransactionRequest::default()
            .with_to(wallet)
            .with_input(GnosisSafe::nonceCall {}.abi_encode());

        let output = self
            .provider
            .call(&tx)
            .await
            .map_err(|e| SafeError::Rpc(format!("nonce() on {wallet}: {e}")))?;

        let decoded = GnosisSafe::nonceCall::abi_decode_returns(&output, true)
            .map_err(|e| {
                SafeError::Rpc(format!("nonce() on {wallet} returned malformed data: {e}"))
            })?;
        Ok(decoded._0)
    }
}
