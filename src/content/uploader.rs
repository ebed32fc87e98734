//! Content uploader
//!
//! Turns free text plus zero or more attachments into a single content id:
//!
//! | text | files | upload                                               |
//! |------|-------|------------------------------------------------------|
//! | yes  | 0     | text as `content.txt`                                |
//! | no   | 1     | the file as-is                                       |
//! | yes  | 1     | file, then `{text, fileContentId, fileName, ...}`    |
//! | any  | 2+    | all files concurrently, then `{text, fileContentIds, fileNames, ...}` |
//! | no   | 0     | rejected with `InvalidInput`                         |

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::domain::{
    Attachment, ContentId, MultiFileEnvelope, SingleFileEnvelope, UploadShape,
};
use crate::infra::{AuthodoxError, ContentStore, Result};

/// File name used when text is uploaded on its own
pub const TEXT_FILE_NAME: &str = "content.txt";

/// Uploads text/attachments to a [`ContentStore`] as one content id.
#[derive(Clone)]
pub struct ContentUploader {
    store: Arc<dyn ContentStore>,
}

impl ContentUploader {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Upload `text` and `files`, returning the id that references them all.
    ///
    /// Any failed sub-upload aborts the call; ids already issued are left
    /// orphaned in the store.
    pub async fn upload(&self, text: &str, files: &[Attachment]) -> Result<ContentId> {
        let shape = UploadShape::select(text, files).ok_or_else(|| {
            AuthodoxError::InvalidInput("No content provided".to_string())
        })?;

        debug!(shape = shape.as_str(), files = files.len(), "Uploading content");

        let id = match shape {
            UploadShape::Text => self.upload_file(&Attachment::text(TEXT_FILE_NAME, text)).await?,
            UploadShape::File => self.upload_file(&files[0]).await?,
            UploadShape::TextWithFile => {
                let file = &files[0];
                let file_content_id = self.upload_file(file).await?;

                let envelope = SingleFileEnvelope {
                    text: text.to_string(),
                    file_content_id,
                    file_name: file.name.clone(),
                    timestamp: Utc::now(),
                };
                self.upload_envelope(&envelope).await?
            }
            UploadShape::MultiFile => {
                let file_content_ids =
                    try_join_all(files.iter().map(|file| self.upload_file(file))).await?;

                let envelope = MultiFileEnvelope {
                    text: text.to_string(),
                    file_content_ids,
                    file_names: files.iter().map(|f| f.name.clone()).collect(),
                    timestamp: Utc::now(),
                };
                self.upload_envelope(&envelope).await?
            }
        };

        info!(shape = shape.as_str(), content_id = %id, "Content uploaded");
        Ok(id)
    }

    async fn upload_file(&self, file: &Attachment) -> Result<ContentId> {
        self.store
            .upload_file(file)
            .await
            .map_err(AuthodoxError::into_upload_failure)
    }

    async fn upload_envelope<T: serde::Serialize>(&self, envelope: &T) -> Result<ContentId> {
        let document = serde_json::to_value(envelope)
            .map_err(|e| AuthodoxError::Internal(format!("envelope serialization: {e}")))?;

        self.store
            .upload_json(&document)
            .await
            .map_err(AuthodoxError::into_upload_failure)
    }
}
