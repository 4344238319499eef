//! Domain vocabulary shared by templates, counters and the engine.
//!
//! # Responsibility
//! - Define the closed set of numbered document kinds.
//! - Define counter identity (`CounterKey`, `PeriodKey`).

pub mod counter;
pub mod document_type;
