//! Safe transaction hashing and owner signatures.
//!
//! The hash is the EIP-712 signing hash of `SafeTx` under the Safe domain
//! `EIP712Domain(uint256 chainId,address verifyingContract)`.

use std::fmt;

use alloy::primitives::{Address, Bytes, PrimitiveSignature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy_sol_types::{Eip712Domain, SolStruct};

use crate::builder::UnsignedTransaction;
use crate::contracts::SafeTx;
use crate::environment::ExecutionEnvironment;
use crate::error::{Result, SafeError};
use crate::utils::{create_signer_from_hex_with_chain_id, to_prefixed_hex};

/// Digest of a Safe transaction together with the state it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHash {
    pub digest: B256,
    pub chain_id: u64,
    pub nonce: U256,
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.digest)
    }
}

/// 65-byte `r || s || v` owner signature over a [`TransactionHash`] digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signer: Address,
    pub bytes: Bytes,
}

impl Signature {
    /// True if the signature recovers to `self.signer` for `digest`.
    pub fn verify(&self, digest: &B256) -> bool {
        let Ok(signature) = PrimitiveSignature::try_from(self.bytes.as_ref()) else {
            return false;
        };
        signature
            .recover_address_from_prehash(digest)
            .is_ok_and(|recovered| recovered == self.signer)
    }

    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.bytes)
    }
}

/// A transaction hash and the signature produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: TransactionHash,
    pub signature: Signature,
}

/// Who is acting on the Safe.
#[derive(Debug, Clone)]
pub enum SignerIdentity {
    /// Holds a private key and can sign.
    Local(PrivateKeySigner),
    /// Address only; can hash and estimate but never sign.
    WatchOnly(Address),
}

impl SignerIdentity {
    pub fn from_private_key(private_key_hex: &str) -> Result<Self> {
        create_signer_from_hex_with_chain_id(private_key_hex, None).map(Self::Local)
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Local(signer) => signer.address(),
            Self::WatchOnly(address) => *address,
        }
    }

    pub fn can_sign(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

/// Hashes Safe transactions and signs them with one identity.
#[derive(Debug, Clone)]
pub struct SignerSession {
    identity: SignerIdentity,
}

impl SignerSession {
    pub fn new(identity: SignerIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &SignerIdentity {
        &self.identity
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    /// Hash `tx` against the wallet's current chain id and nonce.
    pub async fn hash<E: ExecutionEnvironment>(
        &self,
        env: &E,
        tx: &UnsignedTransaction,
    ) -> Result<TransactionHash> {
        let chain_id = env.chain_id().await?;
        let nonce = env.safe_nonce(tx.wallet()).await?;
        Ok(Self::hash_with_nonce(tx, chain_id, nonce))
    }

    /// Pure part of [`SignerSession::hash`].
    pub fn hash_with_nonce(
        tx: &UnsignedTransaction,
        chain_id: u64,
        nonce: U256,
    ) -> TransactionHash {
        let call = tx.call();
        let safe_tx = SafeTx {
            to: call.to,
            value: call.value,
            data: call.data.clone(),
            operation: call.operation.as_u8(),
            safeTxGas: U256::from(tx.safe_tx_gas()),
            baseGas: U256::ZERO,
            gasPrice: U256::ZERO,
            gasToken: Address::ZERO,
            refundReceiver: Address::ZERO,
            nonce,
        };

        TransactionHash {
            digest: safe_tx.eip712_signing_hash(&safe_domain(chain_id, tx.wallet())),
            chain_id,
            nonce,
        }
    }

    /// Sign the digest. Deterministic (RFC 6979) for local keys.
    pub fn sign(&self, hash: &TransactionHash) -> Result<Signature> {
        let signer = match &self.identity {
            SignerIdentity::Local(signer) => signer,
            SignerIdentity::WatchOnly(address) => {
                return Err(SafeError::SigningUnavailable(*address));
            }
        };

        let signature = signer
            .sign_hash_sync(&hash.digest)
            .map_err(|e| SafeError::SigningFailed(e.to_string()))?;

        Ok(Signature {
            signer: signer.address(),
            bytes: Bytes::copy_from_slice(&signature.as_bytes()),
        })
    }
}

fn safe_domain(chain_id: u64, wallet: Address) -> Eip712Domain {
    Eip712Domain {
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(wallet),
        ..Default::default()
    }
}
