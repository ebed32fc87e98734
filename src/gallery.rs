//! Gallery read path: cache and chain scan joined by the Reconciler.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chain_reader::ChainReader;
use crate::domain::ProofRecord;
use crate::infra::{ProofCache, Result};
use crate::reconcile;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    pub records: Vec<ProofRecord>,
    /// False when the chain scan failed or no ledger is configured
    pub chain_scan_complete: bool,
}

#[derive(Clone)]
pub struct GalleryService {
    cache: Arc<dyn ProofCache>,
    chain: Option<ChainReader>,
}

impl GalleryService {
    pub fn new(cache: Arc<dyn ProofCache>, chain: Option<ChainReader>) -> Self {
        Self { cache, chain }
    }

    /// List proofs, optionally by one author.
    ///
    /// The cache query and chain scan run concurrently. Cache errors fail the
    /// call; chain errors degrade to a cache-only view.
    pub async fn list(&self, filter_author: Option<&str>) -> Result<GalleryView> {
        let filter_author = filter_author.map(str::trim).filter(|a| !a.is_empty());

        let cached = async {
            match filter_author {
                Some(author) => self.cache.query_by_author(author).await,
                None => self.cache.query_all().await,
            }
        };
        let scanned = async {
            match &self.chain {
                Some(reader) => Some(reader.list_records(filter_author).await),
                None => None,
            }
        };

        let (cached, scanned) = tokio::join!(cached, scanned);
        let cached = cached?;

        let (scanned, chain_scan_complete) = match scanned {
            Some(Ok(records)) => (records, true),
            Some(Err(e)) => {
                warn!("Error fetching on-chain proofs, showing cache only: {}", e);
                (Vec::new(), false)
            }
            None => (Vec::new(), false),
        };

        let cached_len = cached.len();
        let scanned_len = scanned.len();
        let records = reconcile::merge(cached, scanned);
        info!(
            cached = cached_len,
            scanned = scanned_len,
            merged = records.len(),
            "Gallery assembled"
        );

        Ok(GalleryView {
            records,
            chain_scan_complete,
        })
    }
}
