//! Content read-back: fetch by content id and decode envelopes for display.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ContentId, ResolvedContent};
use crate::infra::{AuthodoxError, ContentStore, Result};

/// Reads content through the store's gateway and unpacks envelopes.
#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, id: &ContentId) -> Result<ResolvedContent> {
        if id.is_empty() {
            return Err(AuthodoxError::InvalidInput("No CID provided.".to_string()));
        }

        let bytes = self.store.fetch(id).await?;
        debug!(content_id = %id, bytes = bytes.len(), "Fetched content");

        Ok(ResolvedContent::decode(&bytes, |file_id| {
            self.store.gateway_url(file_id)
        }))
    }
}
