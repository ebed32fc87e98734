//! SQLite proof cache
//!
//! Holds the same normalized [`ProofRecord`] shape the chain reader produces,
//! so gallery reads do not have to walk the contract.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;

use crate::domain::{ContentId, ProofRecord};
use crate::infra::{AuthodoxError, ProofCache, Result};

/// SQLite-backed proof cache
pub struct SqliteProofCache {
    pool: SqlitePool,
}

impl SqliteProofCache {
    /// Create a new cache with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) a cache database from a URL such as
    /// `sqlite://authodox.db` or `sqlite::memory:`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn initialize(&self) -> Result<()> {
        crate::migrations::run_sqlite(&self.pool)
            .await
            .map_err(|e| AuthodoxError::Configuration(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProofCache for SqliteProofCache {
    async fn insert(&self, record: &ProofRecord) -> Result<i64> {
        let sequence_id = sequence_column(record)?;

        let result = sqlx::query(
            r#"
            INSERT INTO proofs (
                prompt_content_id, response_content_id, metadata_content_id,
                optional_link, author, timestamp, sequence_id,
                transaction_ref, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.prompt_content_id.as_str())
        .bind(record.response_content_id.as_str())
        .bind(record.metadata_content_id.as_str())
        .bind(&record.optional_link)
        .bind(&record.author)
        .bind(record.timestamp)
        .bind(sequence_id)
        .bind(&record.transaction_ref)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            sequence_id = record.sequence_id,
            row_id = result.last_insert_rowid(),
            "Cached proof (insert)"
        );
        Ok(result.last_insert_rowid())
    }

    async fn upsert_by_sequence_id(&self, record: &ProofRecord) -> Result<i64> {
        let sequence_id = sequence_column(record)?;

        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM proofs WHERE sequence_id = ? ORDER BY id ASC LIMIT 1")
                .bind(sequence_id)
                .fetch_optional(&mut *tx)
                .await?;

        let row_id = match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"
                    UPDATE proofs SET
                        prompt_content_id = ?, response_content_id = ?,
                        metadata_content_id = ?, optional_link = ?,
                        author = ?, timestamp = ?, transaction_ref = ?
                    WHERE id = ?
                    "#,
                )
                .bind(record.prompt_content_id.as_str())
                .bind(record.response_content_id.as_str())
                .bind(record.metadata_content_id.as_str())
                .bind(&record.optional_link)
                .bind(&record.author)
                .bind(record.timestamp)
                .bind(&record.transaction_ref)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                debug!(sequence_id = record.sequence_id, row_id = id, "Cached proof (update)");
                id
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO proofs (
                        prompt_content_id, response_content_id, metadata_content_id,
                        optional_link, author, timestamp, sequence_id,
                        transaction_ref, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(record.prompt_content_id.as_str())
                .bind(record.response_content_id.as_str())
                .bind(record.metadata_content_id.as_str())
                .bind(&record.optional_link)
                .bind(&record.author)
                .bind(record.timestamp)
                .bind(sequence_id)
                .bind(&record.transaction_ref)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
                debug!(
                    sequence_id = record.sequence_id,
                    row_id = result.last_insert_rowid(),
                    "Cached proof (upsert insert)"
                );
                result.last_insert_rowid()
            }
        };

        tx.commit().await?;
        Ok(row_id)
    }

    async fn query_all(&self) -> Result<Vec<ProofRecord>> {
        let rows = sqlx::query_as::<_, ProofRow>(
            r#"
            SELECT id, prompt_content_id, response_content_id, metadata_content_id,
                   optional_link, author, timestamp, sequence_id, transaction_ref
            FROM proofs
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProofRecord::try_from).collect()
    }

    async fn query_by_author(&self, author: &str) -> Result<Vec<ProofRecord>> {
        let rows = sqlx::query_as::<_, ProofRow>(
            r#"
            SELECT id, prompt_content_id, response_content_id, metadata_content_id,
                   optional_link, author, timestamp, sequence_id, transaction_ref
            FROM proofs
            WHERE author = ?
            ORDER BY id DESC
            "#,
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProofRecord::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM proofs")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }
}

/// SQLite integers are signed; ids past `i64::MAX` cannot be stored.
fn sequence_column(record: &ProofRecord) -> Result<i64> {
    i64::try_from(record.sequence_id).map_err(|_| {
        AuthodoxError::InvalidInput(format!(
            "sequence id {} is too large to cache",
            record.sequence_id
        ))
    })
}

/// Raw row from the proofs table
#[derive(Debug, FromRow)]
struct ProofRow {
    #[allow(dead_code)]
    id: i64,
    prompt_content_id: String,
    response_content_id: String,
    metadata_content_id: String,
    optional_link: String,
    author: String,
    timestamp: i64,
    sequence_id: i64,
    transaction_ref: String,
}

impl TryFrom<ProofRow> for ProofRecord {
    type Error = AuthodoxError;

    fn try_from(row: ProofRow) -> Result<Self> {
        let sequence_id = u64::try_from(row.sequence_id).map_err(|_| {
            AuthodoxError::Internal(format!("Invalid sequence_id: {}", row.sequence_id))
        })?;

        Ok(ProofRecord {
            prompt_content_id: ContentId::from(row.prompt_content_id),
            response_content_id: ContentId::from(row.response_content_id),
            metadata_content_id: ContentId::from(row.metadata_content_id),
            optional_link: row.optional_link,
            author: row.author,
            timestamp: row.timestamp,
            sequence_id,
            transaction_ref: row.transaction_ref,
        })
    }
}
