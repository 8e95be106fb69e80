pub mod check;
pub mod replay;
pub mod status;
pub mod validate;

use anyhow::{Context, Result};
use drg_store_sqlite::{SqliteStore, SqliteStoreConfig};

use crate::StoreArgs;

/// Opens the policy database named by the command line.
pub(crate) fn open_store(args: &StoreArgs) -> Result<SqliteStore> {
    SqliteStore::open(&SqliteStoreConfig::new(&args.db))
        .with_context(|| format!("Failed to open policy database: {}", args.db.display()))
}
