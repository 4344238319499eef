//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the counter store and template source contracts the engine
//!   depends on.
//! - Keep SQL details out of the numbering service.
//!
//! # Invariants
//! - Counter increments are single-transaction read-modify-write operations.
//! - Template writes are compiled before persistence.

pub mod counter_repo;
pub mod template_repo;
