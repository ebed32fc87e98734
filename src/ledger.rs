//! On-chain proof registry client
//!
//! Calls the deployed proof registry on Polygon Amoy: `registerProof` to mint,
//! `proofData` / `nftContract` / `ownerOf` to read back.

use alloy::network::EthereumWallet;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{SequenceId, POLYGON_AMOY_CHAIN_ID};
use crate::infra::{
    AuthodoxError, OnChainProof, ProofLedger, RegisterProofCall, RegistrationReceipt, Result,
    WalletProvider,
};

const DEFAULT_RPC_URL: &str = "https://rpc-amoy.polygon.technology";
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(180);

// Generate contract bindings
sol! {
    #[sol(rpc)]
    interface IProofRegistry {
        event ProofRegistered(
            uint256 indexed tokenId,
            address indexed author,
            string promptCid,
            string contentCid,
            string metadataUri
        );

        function registerProof(
            string promptCid,
            string contentCid,
            string metadataUri,
            string optionalChatLink
        ) external returns (uint256);

        function proofData(uint256 tokenId) external view returns (
            string promptCid,
            string contentCid,
            string metadataUri,
            string optionalChatLink,
            address author,
            uint256 timestamp
        );

        function nftContract() external view returns (address);
    }

    #[sol(rpc)]
    interface IProofNft {
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

/// Ledger client configuration
#[derive(Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Proof registry contract address
    pub registry_address: Address,
    /// Signing key; without it the client is read-only
    pub private_key: Option<String>,
    /// Chain the registry is deployed on
    pub required_chain_id: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("rpc_url", &self.rpc_url)
            .field("registry_address", &self.registry_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("required_chain_id", &self.required_chain_id)
            .finish()
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless `PROOF_REGISTRY_ADDRESS` is set and parses.
    pub fn from_env() -> Option<Self> {
        let registry_address = std::env::var("PROOF_REGISTRY_ADDRESS")
            .ok()
            .and_then(|s| s.parse().ok())?;
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let private_key = std::env::var("WALLET_PRIVATE_KEY")
            .ok()
            .filter(|s| !s.is_empty());
        let required_chain_id = std::env::var("REQUIRED_CHAIN_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(POLYGON_AMOY_CHAIN_ID);

        Some(Self {
            rpc_url,
            registry_address,
            private_key,
            required_chain_id,
        })
    }
}

/// alloy-backed registry client; doubles as the wallet provider when a
/// signing key is configured.
pub struct AlloyLedger {
    config: LedgerConfig,
    signer: Option<PrivateKeySigner>,
}

impl AlloyLedger {
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let signer = config
            .private_key
            .as_deref()
            .map(|key| {
                key.parse::<PrivateKeySigner>()
                    .map_err(|e| AuthodoxError::Configuration(format!("Invalid private key: {}", e)))
            })
            .transpose()?;

        Ok(Self { config, signer })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Address of the configured signing key, if any
    pub fn signer_address(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.address().to_string())
    }

    fn signer(&self) -> Result<PrivateKeySigner> {
        // Nothing to sign with until WALLET_PRIVATE_KEY is set
        self.signer.clone().ok_or(AuthodoxError::WalletNotConnected)
    }

    fn rpc_url(&self) -> Result<Url> {
        self.config
            .rpc_url
            .parse()
            .map_err(|e| AuthodoxError::Configuration(format!("Invalid RPC URL: {}", e)))
    }

    fn to_sequence_id(value: U256) -> Result<SequenceId> {
        u64::try_from(value)
            .map_err(|_| AuthodoxError::ReadFailure(format!("token id {} out of range", value)))
    }

    fn to_unix_seconds(value: U256) -> Result<i64> {
        u64::try_from(value)
            .ok()
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| AuthodoxError::ReadFailure(format!("timestamp {} out of range", value)))
    }
}

#[async_trait]
impl ProofLedger for AlloyLedger {
    async fn nft_contract(&self) -> Result<String> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);

        let contract = IProofRegistry::new(self.config.registry_address, &provider);

        let result = contract
            .nftContract()
            .call()
            .await
            .map_err(|e| AuthodoxError::ReadFailure(format!("Contract call failed: {}", e)))?;

        Ok(result._0.to_string())
    }

    async fn owner_of(&self, nft_contract: &str, token_id: SequenceId) -> Result<String> {
        let nft_address: Address = nft_contract.parse().map_err(|e| {
            AuthodoxError::ReadFailure(format!("Invalid NFT contract address: {}", e))
        })?;

        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);

        let contract = IProofNft::new(nft_address, &provider);

        let owner = contract
            .ownerOf(U256::from(token_id))
            .call()
            .await
            .map_err(|e| AuthodoxError::ReadFailure(format!("ownerOf({}) failed: {}", token_id, e)))?;

        Ok(owner._0.to_string())
    }

    async fn proof_data(&self, sequence_id: SequenceId) -> Result<OnChainProof> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);

        let contract = IProofRegistry::new(self.config.registry_address, &provider);

        let proof = contract
            .proofData(U256::from(sequence_id))
            .call()
            .await
            .map_err(|e| {
                AuthodoxError::ReadFailure(format!("proofData({}) failed: {}", sequence_id, e))
            })?;

        Ok(OnChainProof {
            prompt_content_id: proof.promptCid,
            response_content_id: proof.contentCid,
            metadata_content_id: proof.metadataUri,
            optional_link: proof.optionalChatLink,
            author: proof.author.to_string(),
            timestamp: Self::to_unix_seconds(proof.timestamp)?,
        })
    }

    async fn send_registration(&self, call: &RegisterProofCall) -> Result<String> {
        info!(
            "Registering proof on chain (prompt {}, content {})",
            call.prompt_content_id, call.response_content_id
        );

        let signer = self.signer()?;

        // Create provider with signer and recommended fillers
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(self.rpc_url()?);

        let contract = IProofRegistry::new(self.config.registry_address, &provider);

        let tx = contract.registerProof(
            call.prompt_content_id.to_string(),
            call.response_content_id.to_string(),
            call.metadata_content_id.to_string(),
            call.optional_link.clone(),
        );

        let pending = tx.send().await.map_err(|e| {
            AuthodoxError::TransactionRejected(format!("Failed to send transaction: {}", e))
        })?;

        let transaction_ref = format!("{:#x}", pending.tx_hash());
        info!("Transaction sent: {}", transaction_ref);

        Ok(transaction_ref)
    }

    async fn await_registration(&self, transaction_ref: &str) -> Result<RegistrationReceipt> {
        let tx_hash: TxHash = transaction_ref.parse().map_err(|e| {
            AuthodoxError::InvalidInput(format!("Invalid transaction hash {}: {}", transaction_ref, e))
        })?;

        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);

        // Poll until the transaction is mined
        let started = Instant::now();
        let receipt = loop {
            let found = provider.get_transaction_receipt(tx_hash).await.map_err(|e| {
                AuthodoxError::TransactionRejected(format!("Failed to get receipt: {}", e))
            })?;

            if let Some(receipt) = found {
                break receipt;
            }

            if started.elapsed() >= RECEIPT_TIMEOUT {
                return Err(AuthodoxError::TransactionRejected(format!(
                    "no receipt for {} after {}s",
                    transaction_ref,
                    RECEIPT_TIMEOUT.as_secs()
                )));
            }

            debug!("Receipt for {} not available yet", transaction_ref);
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        };

        if !receipt.status() {
            return Err(AuthodoxError::TransactionRejected(format!(
                "transaction {} reverted",
                transaction_ref
            )));
        }

        let sequence_id = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<IProofRegistry::ProofRegistered>().ok())
            .map(|decoded| Self::to_sequence_id(decoded.inner.data.tokenId))
            .transpose()?;

        if sequence_id.is_none() {
            warn!(
                "ProofRegistered event not found in logs of {}",
                transaction_ref
            );
        }

        info!(
            "Proof registered in tx {} (block {}, token {:?})",
            transaction_ref,
            receipt.block_number.unwrap_or(0),
            sequence_id
        );

        Ok(RegistrationReceipt {
            transaction_ref: transaction_ref.to_string(),
            sequence_id,
            block_number: receipt.block_number,
        })
    }
}

#[async_trait]
impl WalletProvider for AlloyLedger {
    async fn request_accounts(&self) -> Result<Vec<String>> {
        let signer = self.signer()?;
        Ok(vec![signer.address().to_string()])
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        Ok(self.signer_address().into_iter().collect())
    }

    async fn chain_id(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url()?);

        provider
            .get_chain_id()
            .await
            .map_err(|e| AuthodoxError::ReadFailure(format!("Unable to query network: {}", e)))
    }
}
