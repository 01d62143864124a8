use hl_core::{Error, HeadlineStorage, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

/// Which backend holds the headlines table. Chosen once by the caller and
/// passed down; components never pick a backend on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => write!(f, "memory"),
            StorageKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Build the backend for `kind`. `backend_url` is the database path for
/// SQLite and is ignored by the in-memory store.
pub async fn create_storage(kind: StorageKind, backend_url: Option<&str>) -> Result<Arc<dyn HeadlineStorage>> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = std::path::PathBuf::from(backend_url.unwrap_or(sqlite::DEFAULT_DB_PATH));
            Ok(Arc::new(SQLiteStorage::new_with_path(&path).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            let _ = backend_url;
            Err(Error::Config("SQLite support not compiled in (enable the `sqlite` feature)".to_string()))
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("Invalid table name: {}", table)))
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}
