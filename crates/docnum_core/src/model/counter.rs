//! Counter identity.
//!
//! A counter is addressed by tenant, document type and period key. The
//! template text is deliberately not part of the key, so cosmetic template
//! edits keep counting from where the period left off.

use crate::model::document_type::DocumentType;
use std::fmt::{Display, Formatter};

/// Period key used when a template has no date placeholder.
pub const PERPETUAL_PERIOD_KEY: &str = "ALL";

/// Time bucket that scopes a sequence counter, e.g. `2024` or `2024-03`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Wraps an already formatted key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Key for sequences that never reset.
    pub fn perpetual() -> Self {
        Self(PERPETUAL_PERIOD_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite address of one durable sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub tenant_id: String,
    pub document_type: DocumentType,
    pub period_key: PeriodKey,
}

impl CounterKey {
    pub fn new(
        tenant_id: impl Into<String>,
        document_type: DocumentType,
        period_key: PeriodKey,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            document_type,
            period_key,
        }
    }
}

impl Display for CounterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id, self.document_type, self.period_key
        )
    }
}
