//! Submission of signed transactions to the Safe Transaction Service.

use alloy::primitives::Address;
use reqwest::Url;

use crate::builder::UnsignedTransaction;
use crate::error::{Result, SafeError};
use crate::signer::SignedTransaction;
use crate::types::SafeTxServiceRequest;
use crate::utils::to_prefixed_hex;

const ORIGIN: &str = "safe-proposer";

/// Outcome of a proposal that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    /// The relay accepted the transaction.
    Proposed,
    /// The chain has no relay; the signature must be shared out-of-band.
    NoRelayConfigured,
}

/// HTTP client for the Safe Transaction Service.
///
/// Timeouts and proxies are whatever the wrapped `reqwest::Client` uses.
#[derive(Debug, Clone, Default)]
pub struct ProposalClient {
    http: reqwest::Client,
}

impl ProposalClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Submit `signed` for `tx` to `relay`.
    ///
    /// Returns [`ProposalStatus::NoRelayConfigured`] without any network I/O
    /// when `relay` is `None`. There is no retry; the signature stays valid so
    /// the caller can resubmit.
    pub async fn propose(
        &self,
        relay: Option<&Url>,
        tx: &UnsignedTransaction,
        signed: &SignedTransaction,
    ) -> Result<ProposalStatus> {
        let Some(relay) = relay else {
            return Ok(ProposalStatus::NoRelayConfigured);
        };

        let wallet = tx.wallet().to_checksum(None);
        let api_url = multisig_transactions_url(relay, &wallet);
        let request = service_request(tx, signed);

        tracing::info!(safe = %wallet, safe_tx_hash = %signed.hash, "submitting proposal");

        let response = self
            .http
            .post(&api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SafeError::RelaySubmissionFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%status, "proposal accepted");
            return Ok(ProposalStatus::Proposed);
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(%status, error = %error_text, "proposal rejected");
        Err(SafeError::RelaySubmissionFailed(format!("{status}: {error_text}")))
    }
}

fn multisig_transactions_url(relay: &Url, wallet: &str) -> String {
    format!(
        "{}/api/v1/safes/{}/multisig-transactions/",
        relay.as_str().trim_end_matches('/'),
        wallet
    )
}

/// Request body for `POST /api/v1/safes/{safe}/multisig-transactions/`.
pub fn service_request(
    tx: &UnsignedTransaction,
    signed: &SignedTransaction,
) -> SafeTxServiceRequest {
    let call = tx.call();
    SafeTxServiceRequest {
        to: call.to.to_checksum(None),
        value: call.value.to_string(),
        data: to_prefixed_hex(&call.data),
        operation: call.operation.as_u8(),
        safe_tx_gas: tx.safe_tx_gas().to_string(),
        base_gas: "0".to_string(),
        gas_price: "0".to_string(),
        gas_token: Address::ZERO.to_checksum(None),
        refund_receiver: Address::ZERO.to_checksum(None),
        nonce: signed.hash.nonce.to_string(),
        contract_transaction_hash: signed.hash.to_string(),
        sender: signed.signature.signer.to_checksum(None),
        signature: signed.signature.to_hex(),
        origin: Some(ORIGIN.to_string()),
    }
}
