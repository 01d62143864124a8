use async_trait::async_trait;
use crate::types::ArticleRecord;
use crate::Result;

/// Row selection for [`HeadlineStorage::read_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub source_domain: Option<String>,
}

impl RowFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            source_domain: Some(domain.into()),
        }
    }

    pub fn matches(&self, record: &ArticleRecord) -> bool {
        self.source_domain
            .as_deref()
            .map_or(true, |domain| record.source_domain == domain)
    }
}

#[async_trait]
pub trait HeadlineStorage: Send + Sync {
    /// Read the rows of `table` that match `filter`. A table that does not
    /// exist yet reads as empty.
    async fn read_table(&self, table: &str, filter: &RowFilter) -> Result<Vec<ArticleRecord>>;

    /// Insert `rows` into `table` keyed by `content_hash`. Rows whose key is
    /// already stored are left untouched. Returns the number of rows inserted.
    async fn upsert_table(&self, table: &str, rows: &[ArticleRecord]) -> Result<usize>;
}
