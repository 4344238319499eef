//! Numbering template language.
//!
//! # Responsibility
//! - Compile template text (`PAFO-{{YYYY}}-{{SEQ:5}}`) into typed tokens.
//! - Derive the counter period from the date placeholders in use.
//! - Render a compiled template for one date and sequence value.
//!
//! # Invariants
//! - Compilation is pure and happens before any counter is touched.
//! - Every compiled template holds exactly one sequence placeholder.

pub mod compiler;
pub mod format;
pub mod period;

pub use compiler::{
    compile_template, CompiledTemplate, Placeholder, TemplateCompileError, TemplateToken,
    DEFAULT_SEQUENCE_WIDTH, MAX_SEQUENCE_WIDTH,
};
pub use format::RenderContext;
pub use period::{resolve_period_key, PeriodGranularity};
