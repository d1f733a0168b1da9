//! Assembly of unsigned Safe transactions.

use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

use crate::contracts::MultiSendCallOnly;
use crate::error::{Result, SafeError};
use crate::gas::GasEstimate;
use crate::types::TransactionIntent;

/// Safe operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl Operation {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The call the Safe itself performs when the transaction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeCall {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
}

/// A Safe transaction ready to be hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    wallet: Address,
    intents: Vec<TransactionIntent>,
    safe_tx_gas: u64,
    call: SafeCall,
}

impl UnsignedTransaction {
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    pub fn intents(&self) -> &[TransactionIntent] {
        &self.intents
    }

    pub fn safe_tx_gas(&self) -> u64 {
        self.safe_tx_gas
    }

    pub fn call(&self) -> &SafeCall {
        &self.call
    }

    pub fn is_batch(&self) -> bool {
        self.intents.len() > 1
    }
}

/// Pack intents in the MultiSend layout and wrap them in a `multiSend` call.
pub fn encode_multi_send(intents: &[TransactionIntent]) -> Bytes {
    let mut packed = Vec::new();
    for intent in intents {
        packed.push(Operation::Call.as_u8());
        packed.extend_from_slice(intent.to.as_slice());
        packed.extend_from_slice(&intent.value.to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(intent.data.len()).to_be_bytes::<32>());
        packed.extend_from_slice(&intent.data);
    }

    MultiSendCallOnly::multiSendCall {
        transactions: packed.into(),
    }
    .abi_encode()
    .into()
}

/// Build the unsigned transaction for `intents`.
///
/// `wallet` is `None` until the session has been initialized. The estimate's
/// overestimated total is used as `safeTxGas` without re-estimating. Several
/// intents are bundled through `multi_send` with a delegate call.
pub fn build(
    wallet: Option<Address>,
    intents: &[TransactionIntent],
    estimate: &GasEstimate,
    multi_send: Address,
) -> Result<UnsignedTransaction> {
    let wallet = wallet.ok_or(SafeError::UninitializedWallet)?;

    let call = match intents {
        [] => return Err(SafeError::EmptyTransaction),
        [single] => SafeCall {
            to: single.to,
            value: single.value,
            data: single.data.clone(),
            operation: Operation::Call,
        },
        batch => SafeCall {
            to: multi_send,
            value: U256::ZERO,
            data: encode_multi_send(batch),
            operation: Operation::DelegateCall,
        },
    };

    Ok(UnsignedTransaction {
        wallet,
        intents: intents.to_vec(),
        safe_tx_gas: estimate.overestimated,
        call,
    })
}
