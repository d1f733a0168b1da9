//! Estimate → build → sign → propose, as a per-wallet state machine.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{address, Address, U256};
use alloy_sol_types::SolCall;

use crate::builder::{self, UnsignedTransaction};
use crate::chains::{ChainProfile, ChainRegistry, DEFAULT_MULTI_SEND};
use crate::contracts::GnosisSafe;
use crate::environment::ExecutionEnvironment;
use crate::error::{Result, SafeError};
use crate::gas::{self, AggregateGasEstimate, FALLBACK_REFUND_FRACTION};
use crate::proposal::{ProposalClient, ProposalStatus};
use crate::signer::{SignedTransaction, SignerIdentity, SignerSession, TransactionHash};
use crate::types::TransactionIntent;

/// Where a session is in the proposal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    EstimateReady,
    Built,
    Signed,
    Proposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initialized => "Initialized",
            Self::EstimateReady => "EstimateReady",
            Self::Built => "Built",
            Self::Signed => "Signed",
            Self::Proposed => "Proposed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct WalletSession {
    wallet: Address,
    chain_id: u64,
    profile: Option<ChainProfile>,
    signer: SignerSession,
}

/// Drives one Safe through the proposal pipeline.
///
/// Methods take `&mut self`: one transaction is in flight per instance.
/// Use one orchestrator per concurrent proposal.
#[derive(Debug)]
pub struct MultisigOrchestrator<E> {
    env: E,
    registry: Arc<ChainRegistry>,
    proposals: ProposalClient,
    state: SessionState,
    session: Option<WalletSession>,
}

impl<E: ExecutionEnvironment> MultisigOrchestrator<E> {
    pub fn new(env: E, registry: Arc<ChainRegistry>) -> Self {
        Self {
            env,
            registry,
            proposals: ProposalClient::default(),
            state: SessionState::Uninitialized,
            session: None,
        }
    }

    pub fn with_proposal_client(mut self, proposals: ProposalClient) -> Self {
        self.proposals = proposals;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn wallet(&self) -> Option<Address> {
        self.session.as_ref().map(|s| s.wallet)
    }

    pub fn profile(&self) -> Option<&ChainProfile> {
        self.session.as_ref().and_then(|s| s.profile.as_ref())
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.session.as_ref().map(|s| s.signer.address())
    }

    /// True when the wallet's chain has a relay endpoint.
    pub fn can_propose(&self) -> bool {
        self.profile().is_some_and(|p| p.relay_endpoint.is_some())
    }

    /// Bind the session to `wallet` and resolve its chain profile.
    ///
    /// On an unsupported chain the session is still initialized (estimation
    /// and signing keep working) but `UnsupportedChain` is returned and
    /// [`can_propose`](Self::can_propose) is false.
    pub async fn initialize(&mut self, identity: SignerIdentity, wallet: Address) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Err(SafeError::InvalidSessionState {
                operation: "initialize",
                required: "Uninitialized",
            });
        }

        let chain_id = self.env.chain_id().await?;
        let resolved = self.registry.resolve(chain_id).cloned();

        let profile = match &resolved {
            Ok(profile) => {
                if profile.relay_endpoint.is_none() {
                    tracing::warn!(chain_id, "Safe transaction service does not exist for chain");
                }
                Some(profile.clone())
            }
            Err(_) => {
                tracing::warn!(chain_id, "no chain profile; proposals disabled");
                None
            }
        };

        self.session = Some(WalletSession {
            wallet,
            chain_id,
            profile,
            signer: SignerSession::new(identity),
        });
        self.state = SessionState::Initialized;
        tracing::info!(safe = %wallet, chain_id, "session initialized");

        resolved.map(|_| ())
    }

    fn session_for(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
        required: &'static str,
    ) -> Result<&WalletSession> {
        match &self.session {
            Some(session) if allowed.contains(&self.state) => Ok(session),
            _ => Err(SafeError::InvalidSessionState { operation, required }),
        }
    }

    fn built_session(
        &self,
        operation: &'static str,
        tx: &UnsignedTransaction,
    ) -> Result<&WalletSession> {
        let session = self.session_for(operation, &[SessionState::Built], "Built")?;
        if tx.wallet() != session.wallet {
            return Err(SafeError::InvalidInput(format!(
                "transaction is for Safe {}, session is for {}",
                tx.wallet(),
                session.wallet
            )));
        }
        Ok(session)
    }

    /// Estimate gas for `intents`: one intent takes the single path with the
    /// chain's refund fraction, several take the batch path.
    pub async fn estimate_gas(
        &mut self,
        intents: &[TransactionIntent],
    ) -> Result<AggregateGasEstimate> {
        let session = self.session_for("estimate gas", INITIALIZED_STATES, "initialized")?;
        let max_gas_per_tx = session.profile.as_ref().map(|p| p.max_gas_per_tx);

        let estimate = match intents {
            [single] => {
                let refund_fraction = session
                    .profile
                    .as_ref()
                    .map_or(FALLBACK_REFUND_FRACTION, |p| p.refund_fraction);
                let estimate = gas::estimate(
                    &self.env,
                    session.wallet,
                    single,
                    refund_fraction,
                    max_gas_per_tx,
                )
                .await?;
                AggregateGasEstimate::single(estimate)
            }
            batch => gas::estimate_batch(&self.env, session.wallet, batch, max_gas_per_tx).await?,
        };

        self.state = SessionState::EstimateReady;
        Ok(estimate)
    }

    /// Estimate and build the unsigned transaction for `intents`.
    pub async fn create_transaction(
        &mut self,
        intents: &[TransactionIntent],
    ) -> Result<UnsignedTransaction> {
        let estimate = self.estimate_gas(intents).await?;

        let session = self.session_for("create transaction", INITIALIZED_STATES, "initialized")?;
        let multi_send = session.profile.as_ref().map_or(DEFAULT_MULTI_SEND, |p| p.multi_send);
        let tx = builder::build(Some(session.wallet), intents, &estimate.total, multi_send)?;

        tracing::info!(
            intents = tx.intents().len(),
            safe_tx_gas = tx.safe_tx_gas(),
            "transaction built"
        );
        self.state = SessionState::Built;
        Ok(tx)
    }

    /// Estimate and build a transaction in which the Safe calls
    /// `enableModule(module)` on itself.
    pub async fn create_enable_module_transaction(
        &mut self,
        module: Address,
    ) -> Result<UnsignedTransaction> {
        let operation = "create enable-module transaction";
        let session = self.session_for(operation, INITIALIZED_STATES, "initialized")?;
        if module == Address::ZERO || module == SENTINEL_MODULES {
            return Err(SafeError::InvalidInput(format!("invalid module address {module}")));
        }

        let data = GnosisSafe::enableModuleCall { module }.abi_encode();
        let intent = TransactionIntent::call(session.wallet, U256::ZERO, data.into());
        tracing::info!(%module, "enabling module");
        self.create_transaction(&[intent]).await
    }

    /// Safe transaction hash of `tx` at the wallet's current nonce, without signing.
    pub async fn hash_transaction(&self, tx: &UnsignedTransaction) -> Result<TransactionHash> {
        let session = self.built_session("hash transaction", tx)?;
        session.signer.hash(&self.env, tx).await
    }

    /// Hash `tx` against the wallet's current nonce and sign it.
    pub async fn sign_transaction(
        &mut self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction> {
        let session = self.built_session("sign transaction", tx)?;

        let hash = session.signer.hash(&self.env, tx).await?;
        let signature = session.signer.sign(&hash)?;
        tracing::info!(safe_tx_hash = %hash, signer = %signature.signer, "transaction signed");

        self.state = SessionState::Signed;
        Ok(SignedTransaction { hash, signature })
    }

    /// Submit `signed` to the chain's relay.
    ///
    /// Without a relay this logs a warning and returns
    /// [`ProposalStatus::NoRelayConfigured`].
    pub async fn propose_transaction(
        &mut self,
        tx: &UnsignedTransaction,
        signed: &SignedTransaction,
    ) -> Result<ProposalStatus> {
        let session = self.session_for("propose transaction", &[SessionState::Signed], "Signed")?;

        if signed.hash.chain_id != session.chain_id
            || signed.signature.signer != session.signer.address()
        {
            return Err(SafeError::SignatureMismatch);
        }
        let expected = SignerSession::hash_with_nonce(tx, session.chain_id, signed.hash.nonce);
        if expected.digest != signed.hash.digest || !signed.signature.verify(&signed.hash.digest) {
            return Err(SafeError::SignatureMismatch);
        }

        let relay = session.profile.as_ref().and_then(|p| p.relay_endpoint.as_ref());
        let status = self.proposals.propose(relay, tx, signed).await?;
        if status == ProposalStatus::NoRelayConfigured {
            tracing::warn!(
                safe_tx_hash = %signed.hash,
                "Cannot propose tx since there is no Safe transaction service for this chain"
            );
        }

        self.state = SessionState::Proposed;
        Ok(status)
    }
}

/// Head of the Safe's module list; never a valid module.
const SENTINEL_MODULES: Address = address!("0000000000000000000000000000000000000001");

const INITIALIZED_STATES: &[SessionState] = &[
    SessionState::Initialized,
    SessionState::EstimateReady,
    SessionState::Built,
    SessionState::Signed,
    SessionState::Proposed,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::mock::MockEnvironment;
    use crate::gas::RefundFraction;
    use alloy::primitives::{Bytes, U256};

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const SAFE: Address = Address::repeat_byte(0xaa);
    const NO_RELAY_CHAIN: u64 = 9001;

    fn registry() -> Arc<ChainRegistry> {
        let mut registry = ChainRegistry::builtin();
        registry.insert(ChainProfile {
            chain_id: NO_RELAY_CHAIN,
            name: "evmos".to_string(),
            relay_endpoint: None,
            refund_fraction: RefundFraction::from_bps(3_000).unwrap(),
            max_gas_per_tx: 10_000_000,
            multi_send: DEFAULT_MULTI_SEND,
        });
        Arc::new(registry)
    }

    fn intent(byte: u8) -> TransactionIntent {
        TransactionIntent::call(Address::repeat_byte(byte), U256::ZERO, Bytes::new())
    }

    fn build_directly(intents: &[TransactionIntent]) -> UnsignedTransaction {
        let estimate = gas::GasEstimate { raw: 1, overestimated: 1 };
        builder::build(Some(SAFE), intents, &estimate, DEFAULT_MULTI_SEND).unwrap()
    }

    fn env(chain_id: u64) -> MockEnvironment {
        MockEnvironment::new(chain_id)
            .with_gas(Address::repeat_byte(1), 100_000)
            .with_gas(Address::repeat_byte(2), 70_000)
            .with_gas(Address::repeat_byte(3), 12_000_000)
            .with_gas(SAFE, 45_000)
            .with_nonce(5)
    }

    async fn initialized(chain_id: u64) -> MultisigOrchestrator<MockEnvironment> {
        let mut orchestrator = MultisigOrchestrator::new(env(chain_id), registry());
        let identity = SignerIdentity::from_private_key(TEST_KEY).unwrap();
        orchestrator.initialize(identity, SAFE).await.unwrap();
        orchestrator
    }

    #[tokio::test]
    async fn test_initialize_resolves_profile() {
        let orchestrator = initialized(1).await;
        assert_eq!(orchestrator.state(), SessionState::Initialized);
        assert_eq!(orchestrator.wallet(), Some(SAFE));
        assert_eq!(orchestrator.profile().map(|p| p.chain_id), Some(1));
        assert!(orchestrator.can_propose());
    }

    #[tokio::test]
    async fn test_initialize_unsupported_chain_still_initializes() {
        let mut orchestrator = MultisigOrchestrator::new(env(424242), registry());
        let err = orchestrator
            .initialize(SignerIdentity::WatchOnly(Address::ZERO), SAFE)
            .await
            .unwrap_err();

        assert!(matches!(err, SafeError::UnsupportedChain(424242)));
        assert_eq!(orchestrator.state(), SessionState::Initialized);
        assert!(!orchestrator.can_propose());
    }

    #[tokio::test]
    async fn test_unsupported_chain_uses_fallback_fraction_without_ceiling() {
        let mut orchestrator = MultisigOrchestrator::new(env(424242), registry());
        let _ = orchestrator
            .initialize(SignerIdentity::WatchOnly(Address::ZERO), SAFE)
            .await;

        let estimate = orchestrator.estimate_gas(&[intent(3)]).await.unwrap();
        assert_eq!(estimate.total.raw, 12_000_000);
        assert_eq!(estimate.total.overestimated, 13_333_333);
    }

    #[tokio::test]
    async fn test_initialize_twice_fails() {
        let mut orchestrator = initialized(1).await;
        let err = orchestrator
            .initialize(SignerIdentity::WatchOnly(Address::ZERO), SAFE)
            .await
            .unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { required: "Uninitialized", .. }));
    }

    #[tokio::test]
    async fn test_estimate_before_initialize_fails() {
        let mut orchestrator = MultisigOrchestrator::new(env(1), registry());
        let err = orchestrator.estimate_gas(&[intent(1)]).await.unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { .. }));
        assert_eq!(orchestrator.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_estimate_single_uses_chain_fraction() {
        let mut orchestrator = initialized(1).await;
        let estimate = orchestrator.estimate_gas(&[intent(1)]).await.unwrap();
        assert_eq!(estimate.total.overestimated, 142_857);
        assert_eq!(estimate.per_intent.len(), 1);
        assert_eq!(orchestrator.state(), SessionState::EstimateReady);
    }

    #[tokio::test]
    async fn test_estimate_batch_uses_fixed_fraction() {
        let mut orchestrator = initialized(1).await;
        let estimate = orchestrator.estimate_gas(&[intent(1), intent(2)]).await.unwrap();
        assert_eq!(estimate.per_intent[0].overestimated, 111_111);
        assert_eq!(estimate.per_intent[1].overestimated, 77_777);
        assert_eq!(estimate.total.overestimated, 111_111 + 77_777);
    }

    #[tokio::test]
    async fn test_estimate_over_ceiling_keeps_state() {
        let mut orchestrator = initialized(1).await;
        let err = orchestrator.estimate_gas(&[intent(3)]).await.unwrap_err();
        assert!(matches!(err, SafeError::GasLimitExceeded { .. }));
        assert_eq!(orchestrator.state(), SessionState::Initialized);
    }

    #[tokio::test]
    async fn test_estimate_empty_fails() {
        let mut orchestrator = initialized(1).await;
        let err = orchestrator.estimate_gas(&[]).await.unwrap_err();
        assert!(matches!(err, SafeError::EmptyTransaction));
    }

    #[tokio::test]
    async fn test_create_transaction_copies_estimate() {
        let mut orchestrator = initialized(1).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        assert_eq!(tx.safe_tx_gas(), 142_857);
        assert_eq!(tx.wallet(), SAFE);
        assert_eq!(orchestrator.state(), SessionState::Built);
    }

    #[tokio::test]
    async fn test_sign_before_create_fails() {
        let mut orchestrator = initialized(1).await;
        let tx = build_directly(&[intent(1)]);

        let err = orchestrator.sign_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { required: "Built", .. }));

        orchestrator.estimate_gas(&[intent(1)]).await.unwrap();
        let err = orchestrator.sign_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { required: "Built", .. }));
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let mut orchestrator = initialized(1).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let signed = orchestrator.sign_transaction(&tx).await.unwrap();

        assert_eq!(signed.hash.nonce, U256::from(5));
        assert_eq!(signed.hash.chain_id, 1);
        assert!(signed.signature.verify(&signed.hash.digest));
        assert_eq!(Some(signed.signature.signer), orchestrator.signer_address());
        assert_eq!(orchestrator.state(), SessionState::Signed);
    }

    #[tokio::test]
    async fn test_watch_only_can_hash() {
        let mut orchestrator = MultisigOrchestrator::new(env(1), registry());
        orchestrator
            .initialize(SignerIdentity::WatchOnly(Address::repeat_byte(0x42)), SAFE)
            .await
            .unwrap();
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();

        let hash = orchestrator.hash_transaction(&tx).await.unwrap();
        assert_eq!(hash, SignerSession::hash_with_nonce(&tx, 1, U256::from(5)));
        assert_eq!(orchestrator.state(), SessionState::Built);
    }

    #[tokio::test]
    async fn test_sign_watch_only_fails_and_stays_built() {
        let mut orchestrator = MultisigOrchestrator::new(env(1), registry());
        orchestrator
            .initialize(SignerIdentity::WatchOnly(Address::repeat_byte(0x42)), SAFE)
            .await
            .unwrap();
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();

        let err = orchestrator.sign_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, SafeError::SigningUnavailable(_)));
        assert_eq!(orchestrator.state(), SessionState::Built);
    }

    #[tokio::test]
    async fn test_sign_rejects_foreign_wallet() {
        let mut orchestrator = initialized(1).await;
        orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let foreign = builder::build(
            Some(Address::repeat_byte(0xbb)),
            &[intent(1)],
            &gas::GasEstimate { raw: 1, overestimated: 1 },
            DEFAULT_MULTI_SEND,
        )
        .unwrap();
        let err = orchestrator.sign_transaction(&foreign).await.unwrap_err();
        assert!(matches!(err, SafeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_propose_without_relay_returns_status() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        assert!(!orchestrator.can_propose());

        let tx = orchestrator.create_transaction(&[intent(1), intent(2)]).await.unwrap();
        let signed = orchestrator.sign_transaction(&tx).await.unwrap();
        let status = orchestrator.propose_transaction(&tx, &signed).await.unwrap();

        assert_eq!(status, ProposalStatus::NoRelayConfigured);
        assert_eq!(orchestrator.state(), SessionState::Proposed);
    }

    #[tokio::test]
    async fn test_propose_before_sign_fails() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let hash = SignerSession::hash_with_nonce(&tx, NO_RELAY_CHAIN, U256::from(5));
        let signature = SignerSession::new(SignerIdentity::from_private_key(TEST_KEY).unwrap())
            .sign(&hash)
            .unwrap();

        let err = orchestrator
            .propose_transaction(&tx, &SignedTransaction { hash, signature })
            .await
            .unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { required: "Signed", .. }));
    }

    #[tokio::test]
    async fn test_propose_rejects_signature_for_other_transaction() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let signed = orchestrator.sign_transaction(&tx).await.unwrap();

        let other = build_directly(&[intent(2)]);
        let err = orchestrator.propose_transaction(&other, &signed).await.unwrap_err();
        assert!(matches!(err, SafeError::SignatureMismatch));
        assert_eq!(orchestrator.state(), SessionState::Signed);
    }

    #[tokio::test]
    async fn test_propose_rejects_signature_for_other_chain() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        orchestrator.sign_transaction(&tx).await.unwrap();

        // valid signature by the session key, but under chain 1's domain
        let hash = SignerSession::hash_with_nonce(&tx, 1, U256::from(5));
        let signature = SignerSession::new(SignerIdentity::from_private_key(TEST_KEY).unwrap())
            .sign(&hash)
            .unwrap();

        let err = orchestrator
            .propose_transaction(&tx, &SignedTransaction { hash, signature })
            .await
            .unwrap_err();
        assert!(matches!(err, SafeError::SignatureMismatch));
        assert_eq!(orchestrator.state(), SessionState::Signed);
    }

    #[tokio::test]
    async fn test_propose_rejects_signature_from_other_signer() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        orchestrator.sign_transaction(&tx).await.unwrap();

        let hash = SignerSession::hash_with_nonce(&tx, NO_RELAY_CHAIN, U256::from(5));
        let stranger = SignerIdentity::from_private_key(OTHER_KEY).unwrap();
        let signature = SignerSession::new(stranger).sign(&hash).unwrap();
        assert!(signature.verify(&hash.digest));

        let err = orchestrator
            .propose_transaction(&tx, &SignedTransaction { hash, signature })
            .await
            .unwrap_err();
        assert!(matches!(err, SafeError::SignatureMismatch));
    }

    #[tokio::test]
    async fn test_enable_module_transaction() {
        let module = Address::repeat_byte(0x3c);
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;

        let tx = orchestrator.create_enable_module_transaction(module).await.unwrap();
        assert_eq!(orchestrator.state(), SessionState::Built);
        assert!(!tx.is_batch());
        assert_eq!(tx.call().to, SAFE);
        assert_eq!(tx.call().value, U256::ZERO);
        assert_eq!(tx.call().operation, builder::Operation::Call);
        assert_eq!(tx.safe_tx_gas(), 64_285);

        let decoded = GnosisSafe::enableModuleCall::abi_decode(&tx.call().data, true).unwrap();
        assert_eq!(decoded.module, module);

        let signed = orchestrator.sign_transaction(&tx).await.unwrap();
        assert_eq!(signed.hash, SignerSession::hash_with_nonce(&tx, NO_RELAY_CHAIN, U256::from(5)));
        assert!(signed.signature.verify(&signed.hash.digest));

        let status = orchestrator.propose_transaction(&tx, &signed).await.unwrap();
        assert_eq!(status, ProposalStatus::NoRelayConfigured);
    }

    #[tokio::test]
    async fn test_enable_module_rejects_zero_and_sentinel() {
        let mut orchestrator = initialized(1).await;
        for module in [Address::ZERO, SENTINEL_MODULES] {
            let err = orchestrator.create_enable_module_transaction(module).await.unwrap_err();
            assert!(matches!(err, SafeError::InvalidInput(_)));
        }
        assert_eq!(orchestrator.state(), SessionState::Initialized);
    }

    #[tokio::test]
    async fn test_enable_module_requires_initialized_session() {
        let mut orchestrator = MultisigOrchestrator::new(env(1), registry());
        let err = orchestrator
            .create_enable_module_transaction(Address::repeat_byte(0x3c))
            .await
            .unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { .. }));
    }

    #[tokio::test]
    async fn test_session_runs_another_cycle_after_proposal() {
        let mut orchestrator = initialized(NO_RELAY_CHAIN).await;
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let signed = orchestrator.sign_transaction(&tx).await.unwrap();
        orchestrator.propose_transaction(&tx, &signed).await.unwrap();

        let err = orchestrator.propose_transaction(&tx, &signed).await.unwrap_err();
        assert!(matches!(err, SafeError::InvalidSessionState { .. }));

        orchestrator.create_transaction(&[intent(2)]).await.unwrap();
        assert_eq!(orchestrator.state(), SessionState::Built);
    }

    #[tokio::test]
    async fn test_hash_is_stable_for_unchanged_wallet_state() {
        let mut first = initialized(1).await;
        let tx = first.create_transaction(&[intent(1)]).await.unwrap();
        let a = first.sign_transaction(&tx).await.unwrap();

        let mut second = initialized(1).await;
        let tx2 = second.create_transaction(&[intent(1)]).await.unwrap();
        let b = second.sign_transaction(&tx2).await.unwrap();

        assert_eq!(tx, tx2);
        assert_eq!(a.hash, b.hash);
    }

    #[tokio::test]
    async fn test_nonce_change_changes_hash() {
        let before = {
            let mut orchestrator = initialized(1).await;
            let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
            orchestrator.sign_transaction(&tx).await.unwrap()
        };

        let moved_on = MockEnvironment::new(1)
            .with_gas(Address::repeat_byte(1), 100_000)
            .with_nonce(6);
        let mut orchestrator = MultisigOrchestrator::new(moved_on, registry());
        orchestrator
            .initialize(SignerIdentity::from_private_key(TEST_KEY).unwrap(), SAFE)
            .await
            .unwrap();
        let tx = orchestrator.create_transaction(&[intent(1)]).await.unwrap();
        let after = orchestrator.sign_transaction(&tx).await.unwrap();

        assert_ne!(before.hash.digest, after.hash.digest);
        assert_eq!(after.hash.nonce, U256::from(6));
    }
}
