//! Chain reader: enumerates proofs straight from the registry contract.
//!
//! The registry exposes no count, so the number of issued ids is discovered
//! by probing `ownerOf(0)`, `ownerOf(1)`, ... on the linked NFT contract until
//! the first failing lookup. Ids are assumed contiguous from zero. This is
//! O(n) contract calls and is kept for compatibility, not speed.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{ContentId, ProofRecord, SequenceId};
use crate::infra::{OnChainProof, ProofLedger, Result};

#[derive(Clone)]
pub struct ChainReader {
    ledger: Arc<dyn ProofLedger>,
}

impl ChainReader {
    pub fn new(ledger: Arc<dyn ProofLedger>) -> Self {
        Self { ledger }
    }

    /// Count issued ids by probing ownership until the first failure.
    pub async fn count_issued(&self, nft_contract: &str) -> SequenceId {
        let mut issued: SequenceId = 0;
        loop {
            match self.ledger.owner_of(nft_contract, issued).await {
                Ok(_) => issued += 1,
                Err(e) => {
                    debug!("ownerOf({}) failed, treating as end of issued ids: {}", issued, e);
                    return issued;
                }
            }
        }
    }

    /// List every on-chain record, optionally only those by `filter_author`
    /// (case-insensitive). Any read error aborts the whole scan.
    pub async fn list_records(&self, filter_author: Option<&str>) -> Result<Vec<ProofRecord>> {
        match filter_author {
            Some(author) => info!("Fetching on-chain proofs for {}", author),
            None => info!("Fetching all on-chain proofs"),
        }

        let nft_contract = self.ledger.nft_contract().await?;
        let issued = self.count_issued(&nft_contract).await;
        info!("Found {} total NFTs on-chain", issued);

        let mut records = Vec::new();
        for sequence_id in 0..issued {
            let proof = self.ledger.proof_data(sequence_id).await?;

            if let Some(author) = filter_author {
                if !proof.author.eq_ignore_ascii_case(author.trim()) {
                    continue;
                }
            }

            records.push(Self::to_record(sequence_id, proof));
        }

        info!("Finished fetching {} on-chain proofs", records.len());
        Ok(records)
    }

    fn to_record(sequence_id: SequenceId, proof: OnChainProof) -> ProofRecord {
        ProofRecord {
            prompt_content_id: ContentId::from(proof.prompt_content_id),
            response_content_id: ContentId::from(proof.response_content_id),
            metadata_content_id: ContentId::from(proof.metadata_content_id),
            optional_link: proof.optional_link,
            author: proof.author,
            timestamp: proof.timestamp,
            sequence_id,
            // Not recoverable from a read-only scan
            transaction_ref: String::new(),
        }
    }
}
