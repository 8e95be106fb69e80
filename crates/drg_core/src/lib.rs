//! # Data Reliability Guardrails Core
//!
//! Core data structures and types for Data Reliability Guardrails (DRG).
//!
//! DRG gates a data pipeline's downstream consumers behind an automated contract
//! validation step. This crate provides the pieces every other crate shares: the
//! contract a batch is checked against, the per-check outcome produced by the
//! validation engine, and the report that summarizes one validation invocation.
//!
//! ## Key Concepts
//!
//! - **Contract**: Declarative expectation for a dataset's schema and quality thresholds
//! - **Checks**: Typed configuration for the volume, freshness and distribution checks
//! - **ValidationResult**: Immutable outcome of one check for one batch
//! - **ValidationReport**: Ordered results of one validation invocation plus statistics
//!
//! ## Example
//!
//! ```rust
//! use drg_core::{ContractBuilder, SchemaFieldBuilder};
//!
//! let contract = ContractBuilder::new("nyc_taxi_rides")
//!     .owner("data-platform")
//!     .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
//!     .field(SchemaFieldBuilder::new("pickup_datetime", "timestamp").required(true).build())
//!     .volume(100, Some(100_000))
//!     .freshness(24.0)
//!     .build();
//!
//! assert_eq!(contract.required_fields().count(), 2);
//! assert!(contract.checks.contains("volume"));
//! ```

pub mod builder;
pub mod contract;
pub mod error;
pub mod result;
pub mod validator;

pub use builder::*;
pub use contract::*;
pub use error::*;
pub use result::*;
pub use validator::*;
