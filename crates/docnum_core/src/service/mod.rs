//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate template resolution, period keys and counters into
//!   preview/allocate use-cases.
//! - Keep callers decoupled from storage details.

pub mod numbering_service;
pub mod template_cache;
