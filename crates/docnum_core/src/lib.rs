//! Document numbering core.
//!
//! Issues unique, monotonically increasing reference numbers per tenant,
//! document type and period from small templates such as
//! `PAFO-{{YYYY}}-{{SEQ:5}}`, and previews the next number without
//! consuming it.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod template;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::counter::{CounterKey, PeriodKey, PERPETUAL_PERIOD_KEY};
pub use model::document_type::{DocumentType, UnknownDocumentType};
pub use repo::counter_repo::{
    CounterOperation, CounterResult, CounterStore, CounterStoreError, SqliteCounterStore,
};
pub use repo::template_repo::{
    InMemoryTemplates, RepoError, RepoResult, SqliteTemplateRepository, TemplateRecord,
    TemplateSource, DEFAULT_PURCHASE_ORDER_FOLLOWUP_TEMPLATE,
};
pub use service::numbering_service::{
    FormattedNumber, NumberingEngine, NumberingError, NumberingRequest, NumberingResult,
};
pub use service::template_cache::TemplateCache;
pub use template::{
    compile_template, resolve_period_key, CompiledTemplate, PeriodGranularity, Placeholder,
    RenderContext, TemplateCompileError, TemplateToken, DEFAULT_SEQUENCE_WIDTH, MAX_SEQUENCE_WIDTH,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
