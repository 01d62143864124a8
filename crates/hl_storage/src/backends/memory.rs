use async_trait::async_trait;
use hl_core::{ArticleRecord, HeadlineStorage, Result, RowFilter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use crate::validate_table_name;

#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Vec<ArticleRecord>,
    keys: HashSet<String>,
}

impl MemoryTable {
    pub fn insert(&mut self, record: &ArticleRecord) -> bool {
        if !self.keys.insert(record.content_hash.clone()) {
            return false;
        }
        self.rows.push(record.clone());
        true
    }

    pub fn select(&self, filter: &RowFilter) -> Vec<ArticleRecord> {
        self.rows.iter().filter(|r| filter.matches(r)).cloned().collect()
    }
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeadlineStorage for MemoryStorage {
    async fn read_table(&self, table: &str, filter: &RowFilter) -> Result<Vec<ArticleRecord>> {
        validate_table_name(table)?;
        let tables = self.tables.read().await;
        Ok(tables.get(table).map(|t| t.select(filter)).unwrap_or_default())
    }

    async fn upsert_table(&self, table: &str, rows: &[ArticleRecord]) -> Result<usize> {
        validate_table_name(table)?;
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();
        let inserted = rows.iter().filter(|r| entry.insert(r)).count();
        debug!(table, offered = rows.len(), inserted, "memory upsert");
        Ok(inserted)
    }
}
