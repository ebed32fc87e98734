//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use authodox::content::KeyStatus;
use authodox::domain::{Attachment, ContentId, ProofRecord, SequenceId, POLYGON_AMOY_CHAIN_ID};
use authodox::infra::{
    AuthodoxError, ContentStore, OnChainProof, ProofLedger, RegisterProofCall,
    RegistrationReceipt, Result, SqliteProofCache, WalletProvider,
};
use authodox::server::{AppState, Services};
use authodox::wallet::WalletSession;

/// Test wallet address (anvil account 0)
pub const TEST_AUTHOR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Content store that keeps everything in memory and counts uploads.
#[derive(Default)]
pub struct MemoryContentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    fail_uploads: bool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &ContentId) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(id.as_str()).cloned()
    }

    fn put(&self, bytes: Vec<u8>) -> Result<ContentId> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_uploads {
            return Err(AuthodoxError::UploadFailure("503 Service Unavailable".into()));
        }
        let id = format!("bafytest{n:04}");
        self.objects.lock().unwrap().insert(id.clone(), bytes);
        Ok(ContentId::from(id))
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn upload_file(&self, file: &Attachment) -> Result<ContentId> {
        self.put(file.bytes.clone())
    }

    async fn upload_json(&self, document: &serde_json::Value) -> Result<ContentId> {
        let bytes = serde_json::to_vec(document)
            .map_err(|e| AuthodoxError::Internal(e.to_string()))?;
        self.put(bytes)
    }

    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>> {
        self.get(id)
            .ok_or_else(|| AuthodoxError::NotFound(format!("content {id}")))
    }

    fn gateway_url(&self, id: &str) -> String {
        format!("https://gateway.test/ipfs/{id}")
    }
}

/// Registry contract simulated in memory. Ids are issued from zero.
pub struct FakeLedger {
    author: String,
    proofs: Mutex<Vec<OnChainProof>>,
    /// Sent but not yet confirmed: tx hash -> (sequence id, block)
    pending: Mutex<HashMap<String, (SequenceId, u64)>>,
    emit_event: bool,
    registrations: AtomicUsize,
}

impl FakeLedger {
    pub fn new(author: &str) -> Self {
        Self {
            author: author.to_string(),
            proofs: Mutex::new(Vec::new()),
            pending: Mutex::new(HashMap::new()),
            emit_event: true,
            registrations: AtomicUsize::new(0),
        }
    }

    /// A ledger whose receipts never carry the `ProofRegistered` event.
    pub fn without_events(author: &str) -> Self {
        Self {
            emit_event: false,
            ..Self::new(author)
        }
    }

    /// Pre-populate a proof minted outside the cached path.
    pub fn seed(&self, author: &str, prompt: &str) {
        self.proofs.lock().unwrap().push(OnChainProof {
            prompt_content_id: prompt.to_string(),
            response_content_id: format!("{prompt}-response"),
            metadata_content_id: format!("{prompt}-metadata"),
            optional_link: String::new(),
            author: author.to_string(),
            timestamp: 1_700_000_000,
        });
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofLedger for FakeLedger {
    async fn nft_contract(&self) -> Result<String> {
        Ok("0x00000000000000000000000000000000000000aa".to_string())
    }

    async fn owner_of(&self, _nft_contract: &str, token_id: SequenceId) -> Result<String> {
        let proofs = self.proofs.lock().unwrap();
        proofs
            .get(token_id as usize)
            .map(|p| p.author.clone())
            .ok_or_else(|| AuthodoxError::ReadFailure("ERC721NonexistentToken".into()))
    }

    async fn proof_data(&self, sequence_id: SequenceId) -> Result<OnChainProof> {
        self.proofs
            .lock()
            .unwrap()
            .get(sequence_id as usize)
            .cloned()
            .ok_or_else(|| AuthodoxError::ReadFailure("proof not found".into()))
    }

    async fn send_registration(&self, call: &RegisterProofCall) -> Result<String> {
        let n = self.registrations.fetch_add(1, Ordering::SeqCst);
        let mut proofs = self.proofs.lock().unwrap();
        proofs.push(OnChainProof {
            prompt_content_id: call.prompt_content_id.to_string(),
            response_content_id: call.response_content_id.to_string(),
            metadata_content_id: call.metadata_content_id.to_string(),
            optional_link: call.optional_link.clone(),
            author: self.author.clone(),
            timestamp: 1_700_000_100,
        });
        let sequence_id = (proofs.len() - 1) as SequenceId;

        let transaction_ref = format!("0x{:064x}", n + 1);
        self.pending
            .lock()
            .unwrap()
            .insert(transaction_ref.clone(), (sequence_id, 100 + n as u64));
        Ok(transaction_ref)
    }

    async fn await_registration(&self, transaction_ref: &str) -> Result<RegistrationReceipt> {
        let (sequence_id, block_number) = self
            .pending
            .lock()
            .unwrap()
            .remove(transaction_ref)
            .ok_or_else(|| AuthodoxError::TransactionRejected(format!("unknown tx {transaction_ref}")))?;

        Ok(RegistrationReceipt {
            transaction_ref: transaction_ref.to_string(),
            sequence_id: self.emit_event.then_some(sequence_id),
            block_number: Some(block_number),
        })
    }
}

/// Wallet provider with a fixed account and chain.
pub struct FakeWallet {
    pub address: String,
    pub chain_id: u64,
}

impl FakeWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            address: TEST_AUTHOR.to_string(),
            chain_id,
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(vec![self.address.clone()])
    }

    async fn accounts(&self) -> Result<Vec<String>> {
        Ok(vec![self.address.clone()])
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }
}

/// In-memory, migrated proof cache.
pub async fn memory_cache() -> SqliteProofCache {
    let cache = SqliteProofCache::connect("sqlite::memory:", 1)
        .await
        .expect("open in-memory sqlite");
    cache.initialize().await.expect("migrate");
    cache
}

/// Cached-path record fixture.
pub fn record(sequence_id: SequenceId, author: &str, transaction_ref: &str) -> ProofRecord {
    ProofRecord {
        prompt_content_id: ContentId::from(format!("prompt-{sequence_id}")),
        response_content_id: ContentId::from(format!("response-{sequence_id}")),
        metadata_content_id: ContentId::from(format!("metadata-{sequence_id}")),
        optional_link: String::new(),
        author: author.to_string(),
        timestamp: 1_700_000_000 + sequence_id as i64,
        sequence_id,
        transaction_ref: transaction_ref.to_string(),
    }
}

/// Everything a full-stack test needs a handle on.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryContentStore>,
    pub ledger: Arc<FakeLedger>,
}

/// Application state wired to in-memory fakes.
pub async fn test_app(wallet_chain_id: u64) -> TestApp {
    let store = Arc::new(MemoryContentStore::new());
    let ledger = Arc::new(FakeLedger::new(TEST_AUTHOR));

    let state = AppState::new(Services {
        cache: Arc::new(memory_cache().await),
        content: store.clone(),
        ledger: Some(ledger.clone()),
        wallet: Some(Arc::new(FakeWallet::on_chain(wallet_chain_id))),
        session: Arc::new(WalletSession::new()),
        required_chain_id: POLYGON_AMOY_CHAIN_ID,
        key_status: KeyStatus::Valid,
    });

    TestApp {
        state,
        store,
        ledger,
    }
}
