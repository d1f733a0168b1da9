use std::fs;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};

use reqwest::Url;
use safe_proposer::types::TxBuilderFile;
use safe_proposer::{
    AggregateGasEstimate, ChainProfile, ChainRegistry, MultisigOrchestrator, ProposalStatus,
    RpcEnvironment, SafeError, SignerIdentity, TransactionIntent, UnsignedTransaction,
};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn chains(registry: &ChainRegistry) -> CommandResult {
    println!("Configured chains:");
    for profile in registry.profiles() {
        let relay = profile
            .relay_endpoint
            .as_ref()
            .map_or_else(|| "none (share signatures out-of-band)".to_string(), Url::to_string);
        println!("  {} (ID: {})", profile.name, profile.chain_id);
        println!("    Relay:          {}", relay);
        println!("    Refund fraction: {}", profile.refund_fraction);
        println!("    Max gas per tx:  {}", profile.max_gas_per_tx);
    }
    Ok(())
}

pub async fn estimate(
    registry: Arc<ChainRegistry>,
    safe_address: &str,
    node_url: &str,
    json_file: &str,
) -> CommandResult {
    let safe: Address = safe_address.parse()?;
    let intents = read_intents(json_file)?;

    let mut orchestrator = MultisigOrchestrator::new(connect(node_url).await?, registry);
    initialize(&mut orchestrator, SignerIdentity::WatchOnly(Address::ZERO), safe).await?;

    let estimate = orchestrator.estimate_gas(&intents).await?;
    print_estimate(&estimate);
    Ok(())
}

pub async fn hash(
    registry: Arc<ChainRegistry>,
    safe_address: &str,
    node_url: &str,
    json_file: &str,
) -> CommandResult {
    let safe: Address = safe_address.parse()?;
    let intents = read_intents(json_file)?;

    let mut orchestrator = MultisigOrchestrator::new(connect(node_url).await?, registry);
    initialize(&mut orchestrator, SignerIdentity::WatchOnly(Address::ZERO), safe).await?;

    let tx = orchestrator.create_transaction(&intents).await?;
    let hash = orchestrator.hash_transaction(&tx).await?;

    println!("📋 Safe transaction");
    println!("  Safe: {}", safe.to_checksum(None));
    println!("  Chain ID: {}", hash.chain_id);
    println!("  Safe Nonce: {}", hash.nonce);
    println!("  safeTxGas: {}", tx.safe_tx_gas());
    println!("  Intents: {}", tx.intents().len());
    println!("  Safe Tx Hash: {}", hash);
    Ok(())
}

pub async fn propose(
    registry: Arc<ChainRegistry>,
    safe_address: &str,
    node_url: &str,
    json_file: &str,
    private_key: &str,
) -> CommandResult {
    let safe: Address = safe_address.parse()?;
    let intents = read_intents(json_file)?;
    let identity = SignerIdentity::from_private_key(private_key)?;

    let mut orchestrator = MultisigOrchestrator::new(connect(node_url).await?, registry);
    print_header(safe, identity.address());
    initialize(&mut orchestrator, identity, safe).await?;

    let tx = orchestrator.create_transaction(&intents).await?;
    sign_and_propose(&mut orchestrator, &tx, safe).await
}

pub async fn enable_module(
    registry: Arc<ChainRegistry>,
    safe_address: &str,
    node_url: &str,
    module: &str,
    private_key: &str,
) -> CommandResult {
    let safe: Address = safe_address.parse()?;
    let module: Address = module.parse()?;
    let identity = SignerIdentity::from_private_key(private_key)?;

    let mut orchestrator = MultisigOrchestrator::new(connect(node_url).await?, registry);
    print_header(safe, identity.address());
    initialize(&mut orchestrator, identity, safe).await?;

    println!("  Module: {}", module.to_checksum(None));
    let tx = orchestrator.create_enable_module_transaction(module).await?;
    sign_and_propose(&mut orchestrator, &tx, safe).await
}

// ============================================================================
// Helper Functions
// ============================================================================

fn print_header(safe: Address, sender: Address) {
    println!("📋 Preparing transaction proposal...");
    println!("  Safe: {}", safe.to_checksum(None));
    println!("  Sender: {}", sender.to_checksum(None));
}

async fn sign_and_propose<P: Provider>(
    orchestrator: &mut MultisigOrchestrator<RpcEnvironment<P>>,
    tx: &UnsignedTransaction,
    safe: Address,
) -> CommandResult {
    if let Some(profile) = orchestrator.profile() {
        println!("  Chain: {} (ID: {})", profile.name, profile.chain_id);
    }
    println!("  safeTxGas: {}", tx.safe_tx_gas());

    let signed = orchestrator.sign_transaction(tx).await?;
    println!("  Safe Nonce: {}", signed.hash.nonce);
    println!("  Safe Tx Hash: {}", signed.hash);
    println!("  Signature: {}", signed.signature.to_hex());

    println!("\n📤 Submitting proposal to Safe Transaction Service...");
    match orchestrator.propose_transaction(tx, &signed).await? {
        ProposalStatus::Proposed => {
            println!("✅ Transaction proposed successfully!");
            if let Some(profile) = orchestrator.profile() {
                println!("\n🔗 View in Safe UI:");
                println!("   {}", safe_ui_url(profile, safe));
            }
            println!("\n✨ Other signers can now approve this transaction in the Safe UI");
        }
        ProposalStatus::NoRelayConfigured => {
            println!("⚠️  No Safe Transaction Service for this chain; nothing was submitted");
            println!("Share the Safe Tx Hash and signature above with the other owners.");
        }
    }

    Ok(())
}

async fn connect(
    node_url: &str,
) -> Result<RpcEnvironment<impl Provider>, Box<dyn std::error::Error>> {
    let provider = ProviderBuilder::new().on_builtin(node_url).await?;
    Ok(RpcEnvironment::new(provider))
}

/// Initialize, treating a chain without profile as a warning rather than an error.
async fn initialize<P: Provider>(
    orchestrator: &mut MultisigOrchestrator<RpcEnvironment<P>>,
    identity: SignerIdentity,
    safe: Address,
) -> CommandResult {
    match orchestrator.initialize(identity, safe).await {
        Ok(()) => Ok(()),
        Err(SafeError::UnsupportedChain(chain_id)) => {
            println!("⚠️  No chain profile for chain {}; proposals cannot be submitted", chain_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn read_intents(json_file: &str) -> Result<Vec<TransactionIntent>, Box<dyn std::error::Error>> {
    let json_content = fs::read_to_string(json_file)?;
    let file: TxBuilderFile = serde_json::from_str(&json_content)?;
    Ok(file.into_intents()?)
}

fn print_estimate(estimate: &AggregateGasEstimate) {
    println!("⛽ Gas estimate");
    if estimate.per_intent.len() > 1 {
        for (index, item) in estimate.per_intent.iter().enumerate() {
            println!("  [{}] raw: {}, overestimated: {}", index, item.raw, item.overestimated);
        }
    }
    println!("  Raw total: {}", estimate.total.raw);
    println!("  safeTxGas: {}", estimate.total.overestimated);
}

fn safe_ui_url(profile: &ChainProfile, safe: Address) -> String {
    let safe = safe.to_checksum(None);
    match profile.name.as_str() {
        "sepolia" => format!("https://app.safe.global/transactions/queue?safe=sep:{}", safe),
        "mainnet" => format!("https://app.safe.global/transactions/queue?safe=eth:{}", safe),
        "base" => format!("https://app.safe.global/transactions/queue?safe=base:{}", safe),
        "polygon" => format!("https://app.safe.global/transactions/queue?safe=matic:{}", safe),
        "arbitrum" => format!("https://app.safe.global/transactions/queue?safe=arb1:{}", safe),
        _ => format!("https://app.safe.global/transactions/queue?safe={}", safe),
    }
}
