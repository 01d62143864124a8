use async_trait::async_trait;
use chrono::NaiveDate;
use hl_core::{ArticleRecord, Error, HeadlineStorage, Result, RowFilter};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use crate::validate_table_name;

pub const DEFAULT_DB_PATH: &str = "headlines.db";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            content_hash TEXT PRIMARY KEY,
            external_id TEXT NOT NULL,
            title TEXT NOT NULL,
            publish_date TEXT NOT NULL,
            scrape_date TEXT NOT NULL,
            source_domain TEXT NOT NULL,
            listing_path TEXT NOT NULL,
            article_url TEXT NOT NULL
        )
        "#
    )
}

fn storage_err(context: &str, e: sqlx::Error) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| storage_err("Failed to connect to database", e))?;

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn ensure_table(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        sqlx::query(&create_table_sql(table))
            .execute(&*self.pool)
            .await
            .map_err(|e| storage_err("Failed to create table", e))?;
        Ok(())
    }
}

fn parse_date(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| storage_err("Failed to read row", e))?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| Error::Storage(format!("Failed to parse {} '{}': {}", column, raw, e)))
}

fn record_from_row(row: &SqliteRow) -> Result<ArticleRecord> {
    let text = |column: &str| -> Result<String> {
        row.try_get(column).map_err(|e| storage_err("Failed to read row", e))
    };
    let external_id = text("external_id")?;

    Ok(ArticleRecord {
        content_hash: text("content_hash")?,
        external_id: Uuid::parse_str(&external_id)
            .map_err(|e| Error::Storage(format!("Failed to parse external_id '{}': {}", external_id, e)))?,
        title: text("title")?,
        publish_date: parse_date(row, "publish_date")?,
        scrape_date: parse_date(row, "scrape_date")?,
        source_domain: text("source_domain")?,
        listing_path: text("listing_path")?,
        article_url: text("article_url")?,
    })
}

#[async_trait]
impl HeadlineStorage for SQLiteStorage {
    async fn read_table(&self, table: &str, filter: &RowFilter) -> Result<Vec<ArticleRecord>> {
        self.ensure_table(table).await?;

        let rows = match &filter.source_domain {
            Some(domain) => {
                sqlx::query(&format!(
                    "SELECT * FROM {table} WHERE source_domain = ? ORDER BY publish_date DESC"
                ))
                .bind(domain)
                .fetch_all(&*self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("SELECT * FROM {table} ORDER BY publish_date DESC"))
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| storage_err("Failed to read table", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn upsert_table(&self, table: &str, rows: &[ArticleRecord]) -> Result<usize> {
        self.ensure_table(table).await?;

        let sql = format!(
            r#"
            INSERT OR IGNORE INTO {table}
            (content_hash, external_id, title, publish_date, scrape_date, source_domain, listing_path, article_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        let mut inserted = 0usize;
        for record in rows {
            let result = sqlx::query(&sql)
                .bind(&record.content_hash)
                .bind(record.external_id.to_string())
                .bind(&record.title)
                .bind(record.publish_date.format(DATE_FORMAT).to_string())
                .bind(record.scrape_date.format(DATE_FORMAT).to_string())
                .bind(&record.source_domain)
                .bind(&record.listing_path)
                .bind(&record.article_url)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_err("Failed to store headline", e))?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit headlines", e))?;

        debug!(table, offered = rows.len(), inserted, "sqlite upsert");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::ArticleFields;
    use tempfile::tempdir;

    fn record(url: &str, day: u32) -> ArticleRecord {
        ArticleFields {
            title: Some(format!("Titular {}", day)),
            publish_date: NaiveDate::from_ymd_opt(2024, 2, day),
            article_url: Some(url.to_string()),
            scrape_date: NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            source_domain: "https://www.elperiodico.com".to_string(),
            listing_path: "/es/temas/pymes-42198".to_string(),
        }
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        assert!(storage.read_table("headlines", &RowFilter::all()).await.unwrap().is_empty());

        let a = record("https://www.elperiodico.com/es/economia/a.html", 10);
        let b = record("https://www.elperiodico.com/es/economia/b.html", 12);
        assert_eq!(storage.upsert_table("headlines", &[a.clone(), b.clone()]).await.unwrap(), 2);

        let again = record("https://www.elperiodico.com/es/economia/a.html", 10);
        assert_eq!(storage.upsert_table("headlines", &[again]).await.unwrap(), 0);

        let rows = storage
            .read_table("headlines", &RowFilter::domain("https://www.elperiodico.com"))
            .await
            .unwrap();
        assert_eq!(rows, vec![b, a]);

        let other = storage
            .read_table("headlines", &RowFilter::domain("https://www.regio7.cat"))
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_table_name() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("t.db")).await.unwrap();
        assert!(storage.upsert_table("x; DROP TABLE y", &[]).await.is_err());
    }
}
