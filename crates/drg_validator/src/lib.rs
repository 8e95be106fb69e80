//! # DRG Validator
//!
//! Validation engine for data reliability contracts. This crate evaluates one
//! batch against one contract and reports an ordered list of check outcomes:
//!
//! - Schema presence (required fields exist as columns)
//! - Volume (row count within bounds)
//! - Freshness (newest event recent enough)
//! - Distribution drift (PSI against a reference dataset)
//!
//! Batches are columnar tables of [`DataValue`]s and can be read from Parquet.
//!
//! ## Example
//!
//! ```rust
//! use drg_core::{ContractBuilder, SchemaFieldBuilder};
//! use drg_validator::{Batch, Column, run_validations};
//!
//! let contract = ContractBuilder::new("rides")
//!     .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
//!     .build();
//! let batch = Batch::new(vec![Column::from_values("vendor_id", [1i64, 2, 3])]).unwrap();
//!
//! let results = run_validations(&batch, &contract);
//!
//! assert!(results[0].passed());
//! assert_eq!(results[1].metric().as_f64(), Some(3.0));
//! ```

mod dataset;
mod distribution;
mod engine;
mod error;
mod freshness;
mod parquet_io;
mod schema;
mod volume;

pub use dataset::*;
pub use distribution::*;
pub use engine::*;
pub use error::*;
pub use freshness::*;
pub use parquet_io::*;
pub use schema::*;
pub use volume::*;
