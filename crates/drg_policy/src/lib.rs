//! # DRG Policy
//!
//! Policy gate for data reliability validations. Given the results of one
//! validation run, the gate records the run outcome, opens or resolves the
//! run's incident, and sets the single downstream gate consulted by consumers.
//!
//! Storage is a capability passed to the gate: [`MemoryStore`] here, or a
//! durable implementation of [`PolicyStore`] elsewhere.

mod error;
mod gate;
mod memory;
mod model;
mod store;

pub use error::*;
pub use gate::*;
pub use memory::*;
pub use model::*;
pub use store::*;
