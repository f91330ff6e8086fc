//! File-backed store using redb

use crate::error::{Result, StorageError};
use crate::kv::KeyValueStore;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use tracing::debug;

const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

fn db_err(err: impl Into<redb::Error>) -> StorageError {
    StorageError::Database(err.into())
}

/// Persistent key-value store in a single redb file
///
/// Every write commits its own transaction, so a value is durable as soon
/// as `set`/`delete` returns.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the store at `path`
    ///
    /// Parent directories are created when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(db_err)?;

        // Create the table up front so read transactions never see it missing
        let txn = db.begin_write().map_err(db_err)?;
        txn.open_table(ENTRIES).map_err(db_err)?;
        txn.commit().map_err(db_err)?;

        debug!(path = %path.display(), "Opened session store");
        Ok(Self { db })
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let table = txn.open_table(ENTRIES).map_err(db_err)?;
        let value = table.get(key).map_err(db_err)?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(ENTRIES).map_err(db_err)?;
            table.insert(key, value).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(ENTRIES).map_err(db_err)?;
            table.remove(key).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)
    }
}
