use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SafeError};
use crate::utils::parse_hex_bytes;

/// A call the Safe should make: destination, value and payload.
///
/// The sender is always the Safe itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl TransactionIntent {
    pub fn call(to: Address, value: U256, data: Bytes) -> Self {
        Self { to, value, data }
    }
}

/// One entry of a transaction JSON file.
#[derive(Serialize, Deserialize, Debug)]
pub struct TxBuilderJson {
    pub to: String,
    pub value: String,
    pub data: Option<String>,
}

impl TryFrom<&TxBuilderJson> for TransactionIntent {
    type Error = SafeError;

    fn try_from(json: &TxBuilderJson) -> Result<Self> {
        let to = Address::from_str(&json.to)
            .map_err(|e| SafeError::InvalidInput(format!("to {}: {e}", json.to)))?;
        let value = U256::from_str(&json.value)
            .map_err(|e| SafeError::InvalidInput(format!("value {}: {e}", json.value)))?;
        let data = match &json.data {
            Some(data) => parse_hex_bytes(data)?,
            None => Bytes::new(),
        };
        Ok(Self { to, value, data })
    }
}

/// A transaction file holds either one call or a list of calls.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum TxBuilderFile {
    Single(TxBuilderJson),
    Batch(Vec<TxBuilderJson>),
}

impl TxBuilderFile {
    pub fn into_intents(self) -> Result<Vec<TransactionIntent>> {
        match self {
            Self::Single(tx) => Ok(vec![TransactionIntent::try_from(&tx)?]),
            Self::Batch(txs) => txs.iter().map(TransactionIntent::try_from).collect(),
        }
    }
}

/// Safe Transaction Service API request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTxServiceRequest {
    pub to: String,
    pub value: String,
    pub data: String,
    pub operation: u8,
    pub safe_tx_gas: String,
    pub base_gas: String,
    pub gas_price: String,
    pub gas_token: String,
    pub refund_receiver: String,
    pub nonce: String,
    pub contract_transaction_hash: String,
    pub sender: String,
    pub signature: String,
    pub origin: Option<String>,
}
