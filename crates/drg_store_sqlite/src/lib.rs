//! # DRG SQLite Store
//!
//! Durable implementation of the policy store: pipeline runs, per-check
//! results, incidents and the downstream gate, kept in one `SQLite` file.
//!
//! ## Example
//!
//! ```rust
//! use drg_policy::PolicyGate;
//! use drg_store_sqlite::SqliteStore;
//!
//! let gate = PolicyGate::new(SqliteStore::in_memory().unwrap());
//! assert!(gate.is_gate_open().unwrap());
//! ```

mod config;
mod error;
mod store;

pub use config::*;
pub use error::*;
pub use store::*;
