//! SQLite persistence for chunk records.
//!
//! One table holds everything: chunk text, provenance, and the embedding as
//! a little-endian f16 BLOB. Similarity math happens in [`crate::store`];
//! this module only moves rows in and out of the database.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use half::f16;
use ragmill_chunk::SourceKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::error::{IndexError, Result};
use crate::record::ChunkRecord;

/// Low-level chunk database, wrapping a SQLite connection pool.
#[derive(Clone, Debug)]
pub struct ChunkDb {
    pool: SqlitePool,
}

impl ChunkDb {
    /// Open (or create) the database under the given directory.
    ///
    /// The directory is created if missing; the database file is named
    /// `ragmill.db`. WAL mode keeps readers unblocked during writes.
    pub async fn open(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir)?;
        let db_path = base_dir.join("ragmill.db");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::debug!(path = %db_path.display(), "chunk database ready");
        Ok(db)
    }

    /// Open an in-memory database, for tests.
    pub async fn open_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection: every handle must see the same in-memory db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                source_kind TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a batch of records in one transaction.
    ///
    /// Either every record lands or none do; dropping the transaction on an
    /// early return rolls back automatically.
    pub async fn insert_batch(&self, records: &[ChunkRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let embedding_bytes: &[u8] = bytemuck::cast_slice(&record.embedding);
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, source_kind, chunk_index, content, embedding, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.id)
            .bind(&record.source)
            .bind(record.source_kind.as_str())
            .bind(record.chunk_index as i64)
            .bind(&record.text)
            .bind(embedding_bytes)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch every record in insertion (rowid) order.
    pub async fn fetch_all(&self) -> Result<Vec<ChunkRecord>> {
        let rows = sqlx::query(
            "SELECT id, source, source_kind, chunk_index, content, embedding, created_at
             FROM chunks ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Fetch a single record by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ChunkRecord>> {
        let row = sqlx::query(
            "SELECT id, source, source_kind, chunk_index, content, embedding, created_at
             FROM chunks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Delete one record by id. Returns whether a row was removed.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chunks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every record from a source. Returns the number removed.
    pub async fn delete_by_source(&self, source: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE source = ?")
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every record. Returns the number removed.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Total number of stored records.
    pub async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    /// Close the connection pool. Further operations fail; call once at
    /// process shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Distinct source names, in no particular order.
    pub async fn distinct_sources(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT source FROM chunks")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("source")).collect())
    }
}

fn row_to_record(row: &SqliteRow) -> Result<ChunkRecord> {
    let kind_text: String = row.get("source_kind");
    let source_kind = SourceKind::from_str(&kind_text)
        .map_err(|_| IndexError::invalid_record(format!("unknown source kind: {kind_text}")))?;

    let embedding_bytes: Vec<u8> = row.get("embedding");
    if embedding_bytes.len() % 2 != 0 {
        return Err(IndexError::invalid_record(format!(
            "embedding blob has odd length {}",
            embedding_bytes.len()
        )));
    }
    let embedding: Vec<f16> = bytemuck::pod_collect_to_vec(&embedding_bytes);

    let chunk_index: i64 = row.get("chunk_index");
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(ChunkRecord {
        id: row.get("id"),
        text: row.get("content"),
        embedding,
        source: row.get("source"),
        source_kind,
        chunk_index: chunk_index as usize,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(id: &str, source: &str, values: &[f32]) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            text: format!("text of {id}"),
            embedding: values.iter().copied().map(f16::from_f32).collect(),
            source: source.to_string(),
            source_kind: SourceKind::Pdf,
            chunk_index: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn roundtrips_records_through_disk() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let db = ChunkDb::open(dir.path()).await?;

        let record = sample("c1", "doc.pdf", &[0.25, -0.5, 1.0]);
        db.insert_batch(std::slice::from_ref(&record)).await?;

        let fetched = db.get_by_id("c1").await?.expect("record should exist");
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.text, record.text);
        assert_eq!(fetched.embedding, record.embedding);
        assert_eq!(fetched.source, "doc.pdf");
        assert_eq!(fetched.source_kind, SourceKind::Pdf);
        Ok(())
    }

    #[tokio::test]
    async fn uncreatable_directory_is_an_io_error() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let occupied = dir.path().join("occupied");
        std::fs::write(&occupied, b"not a directory")?;

        // create_dir_all cannot make a directory under a regular file.
        let err = ChunkDb::open(&occupied.join("sub")).await.unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_all_preserves_insertion_order() -> anyhow::Result<()> {
        let db = ChunkDb::open_memory().await?;

        db.insert_batch(&[sample("a", "one.pdf", &[1.0])]).await?;
        db.insert_batch(&[sample("b", "two.pdf", &[1.0]), sample("c", "two.pdf", &[1.0])])
            .await?;

        let all = db.fetch_all().await?;
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn deletes_report_what_they_removed() -> anyhow::Result<()> {
        let db = ChunkDb::open_memory().await?;
        db.insert_batch(&[
            sample("a", "one.pdf", &[1.0]),
            sample("b", "one.pdf", &[1.0]),
            sample("c", "two.pdf", &[1.0]),
        ])
        .await?;

        assert!(db.delete_by_id("c").await?);
        assert!(!db.delete_by_id("c").await?);
        assert_eq!(db.delete_by_source("one.pdf").await?, 2);
        assert_eq!(db.delete_by_source("one.pdf").await?, 0);
        assert_eq!(db.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_the_table() -> anyhow::Result<()> {
        let db = ChunkDb::open_memory().await?;
        db.insert_batch(&[sample("a", "one.pdf", &[1.0]), sample("b", "two.pdf", &[1.0])])
            .await?;

        assert_eq!(db.clear().await?, 2);
        assert_eq!(db.clear().await?, 0);
        assert!(db.fetch_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn distinct_sources_deduplicates() -> anyhow::Result<()> {
        let db = ChunkDb::open_memory().await?;
        db.insert_batch(&[
            sample("a", "one.pdf", &[1.0]),
            sample("b", "one.pdf", &[1.0]),
            sample("c", "two.pdf", &[1.0]),
        ])
        .await?;

        let mut sources = db.distinct_sources().await?;
        sources.sort();
        assert_eq!(sources, vec!["one.pdf", "two.pdf"]);
        Ok(())
    }
}
