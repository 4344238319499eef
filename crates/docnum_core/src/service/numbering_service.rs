//! Document numbering use-cases.
//!
//! # Responsibility
//! - Resolve a tenant's active template, compile it (cached), derive the
//!   counter period and render reference numbers.
//! - `allocate`: consume exactly one durable sequence value per call.
//! - `preview`: render what the next allocation would produce, without
//!   touching counter state.
//!
//! # Invariants
//! - Compilation happens before any counter access.
//! - The date printed in a number is the date that selected its counter.
//! - Allocation errors never hide a committed increment; the counter store
//!   guarantees that a failed call did not consume a value.
//! - The engine never retries on its own, except for one re-read of the
//!   template after a compile failure.

use crate::clock::{Clock, SystemClock};
use crate::model::counter::{CounterKey, PeriodKey};
use crate::model::document_type::DocumentType;
use crate::repo::counter_repo::{CounterStore, CounterStoreError};
use crate::repo::template_repo::{RepoError, TemplateSource};
use crate::service::template_cache::TemplateCache;
use crate::template::{resolve_period_key, CompiledTemplate, RenderContext, TemplateCompileError};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type NumberingResult<T> = Result<T, NumberingError>;

/// Numbering failure returned to the document workflow.
#[derive(Debug)]
pub enum NumberingError {
    /// The tenant has no active template for this document type.
    TemplateNotConfigured {
        tenant_id: String,
        document_type: DocumentType,
    },
    /// The active template is malformed.
    TemplateCompile {
        document_type: DocumentType,
        error: TemplateCompileError,
    },
    /// Transient counter storage failure; nothing was consumed.
    CounterStoreUnavailable(CounterStoreError),
    /// Non-transient counter storage failure.
    CounterStore(CounterStoreError),
    /// The settings collaborator failed to return the template.
    TemplateSource(RepoError),
}

impl NumberingError {
    /// Returns whether the caller may retry the same request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CounterStoreUnavailable(_))
    }

    /// Stable machine-readable code used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TemplateNotConfigured { .. } => "template_not_configured",
            Self::TemplateCompile { .. } => "template_compile_failed",
            Self::CounterStoreUnavailable(_) => "counter_store_unavailable",
            Self::CounterStore(_) => "counter_store_failed",
            Self::TemplateSource(_) => "template_source_failed",
        }
    }
}

impl Display for NumberingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemplateNotConfigured {
                tenant_id,
                document_type,
            } => write!(
                f,
                "no numbering template configured for tenant `{tenant_id}` and document type `{document_type}`"
            ),
            Self::TemplateCompile {
                document_type,
                error,
            } => write!(f, "invalid {document_type} numbering template: {error}"),
            Self::CounterStoreUnavailable(err) => write!(f, "{err}"),
            Self::CounterStore(err) => write!(f, "{err}"),
            Self::TemplateSource(err) => write!(f, "failed to load numbering template: {err}"),
        }
    }
}

impl Error for NumberingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TemplateNotConfigured { .. } => None,
            Self::TemplateCompile { error, .. } => Some(error),
            Self::CounterStoreUnavailable(err) | Self::CounterStore(err) => Some(err),
            Self::TemplateSource(err) => Some(err),
        }
    }
}

impl From<CounterStoreError> for NumberingError {
    fn from(value: CounterStoreError) -> Self {
        if value.is_retryable() {
            Self::CounterStoreUnavailable(value)
        } else {
            Self::CounterStore(value)
        }
    }
}

impl From<RepoError> for NumberingError {
    fn from(value: RepoError) -> Self {
        Self::TemplateSource(value)
    }
}

/// Full request form for preview and allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRequest<'a> {
    /// Tenant identifier resolved upstream.
    pub tenant_id: &'a str,
    pub document_type: DocumentType,
    /// Short code printed by `{{TENANT}}`.
    pub tenant_code: Option<&'a str>,
    /// Explicit instant; the engine clock is used when `None`.
    pub now: Option<DateTime<Utc>>,
}

impl<'a> NumberingRequest<'a> {
    pub fn new(tenant_id: &'a str, document_type: DocumentType) -> Self {
        Self {
            tenant_id,
            document_type,
            tenant_code: None,
            now: None,
        }
    }

    pub fn with_tenant_code(mut self, tenant_code: &'a str) -> Self {
        self.tenant_code = Some(tenant_code);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Rendered number together with the parts that reproduce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedNumber {
    pub number: String,
    pub document_type: DocumentType,
    pub period_key: PeriodKey,
    /// Allocated value, or the hypothetical next value for previews.
    pub sequence: u64,
}

struct Resolved {
    template: Arc<CompiledTemplate>,
    date: NaiveDate,
    key: CounterKey,
}

/// Numbering engine over a template source and a counter store.
///
/// Holds no mutable state besides the compiled-template cache. Workers that
/// allocate concurrently may each build their own engine over their own
/// connection; uniqueness is enforced by the counter store.
pub struct NumberingEngine<T, C, K = SystemClock>
where
    T: TemplateSource,
    C: CounterStore,
    K: Clock,
{
    templates: T,
    counters: C,
    clock: K,
    utc_offset: FixedOffset,
    cache: TemplateCache,
}

impl<T: TemplateSource, C: CounterStore> NumberingEngine<T, C, SystemClock> {
    /// Creates an engine using wall-clock time in UTC.
    pub fn new(templates: T, counters: C) -> Self {
        Self::with_clock(templates, counters, SystemClock)
    }
}

impl<T, C, K> NumberingEngine<T, C, K>
where
    T: TemplateSource,
    C: CounterStore,
    K: Clock,
{
    /// Creates an engine with an explicit time source.
    pub fn with_clock(templates: T, counters: C, clock: K) -> Self {
        Self {
            templates,
            counters,
            clock,
            utc_offset: Utc.fix(),
            cache: TemplateCache::default(),
        }
    }

    /// Sets the offset used to turn instants into business dates, so
    /// periods roll over at the tenant's local midnight.
    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Replaces the compiled-template cache, e.g. to change its capacity.
    pub fn with_template_cache(mut self, cache: TemplateCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn template_cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Renders the number the next allocation would produce.
    pub fn preview(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<String> {
        self.preview_with(&NumberingRequest::new(tenant_id, document_type))
            .map(|formatted| formatted.number)
    }

    /// Allocates and renders the next number.
    pub fn allocate(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<String> {
        self.allocate_with(&NumberingRequest::new(tenant_id, document_type))
            .map(|formatted| formatted.number)
    }

    /// Side-effect-free preview.
    ///
    /// Repeated calls with a fixed `now` and no allocation in between return
    /// the same number. The result is advisory: a concurrent allocation may
    /// take that number first.
    pub fn preview_with(
        &self,
        request: &NumberingRequest<'_>,
    ) -> NumberingResult<FormattedNumber> {
        let started_at = Instant::now();
        let result = self.resolve(request).and_then(|resolved| {
            let stored = self.counters.peek(&resolved.key)?;
            Ok(render(&resolved, request, stored.saturating_add(1)))
        });

        match &result {
            Ok(formatted) => debug!(
                "event=number_preview module=numbering status=ok tenant_id={} document_type={} period_key={} sequence={} duration_ms={}",
                request.tenant_id,
                request.document_type,
                formatted.period_key,
                formatted.sequence,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("number_preview", request, err, started_at),
        }
        result
    }

    /// Durably consumes one sequence value and renders it.
    ///
    /// Every successful call yields a distinct number. A failed call did not
    /// consume anything. If the caller drops the result after success the
    /// number is spent and leaves a gap.
    pub fn allocate_with(
        &self,
        request: &NumberingRequest<'_>,
    ) -> NumberingResult<FormattedNumber> {
        let started_at = Instant::now();
        let result = self.resolve(request).and_then(|resolved| {
            let sequence = self.counters.increment(&resolved.key)?;
            Ok(render(&resolved, request, sequence))
        });

        match &result {
            Ok(formatted) => info!(
                "event=number_allocate module=numbering status=ok tenant_id={} document_type={} period_key={} sequence={} duration_ms={}",
                request.tenant_id,
                request.document_type,
                formatted.period_key,
                formatted.sequence,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("number_allocate", request, err, started_at),
        }
        result
    }

    fn resolve(&self, request: &NumberingRequest<'_>) -> NumberingResult<Resolved> {
        let template = self.resolve_template(request.tenant_id, request.document_type)?;
        let now = request.now.unwrap_or_else(|| self.clock.now());
        let date = now.with_timezone(&self.utc_offset).date_naive();
        let key = CounterKey::new(
            request.tenant_id,
            request.document_type,
            resolve_period_key(&template, date),
        );
        Ok(Resolved {
            template,
            date,
            key,
        })
    }

    fn resolve_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<Arc<CompiledTemplate>> {
        let text = self.load_template_text(tenant_id, document_type)?;
        match self.cache.get_or_compile(&text) {
            Ok(template) => Ok(template),
            Err(first_error) => {
                // A corrected template may have been saved since the read.
                let latest = self.load_template_text(tenant_id, document_type)?;
                if latest == text {
                    return Err(NumberingError::TemplateCompile {
                        document_type,
                        error: first_error,
                    });
                }
                self.cache
                    .get_or_compile(&latest)
                    .map_err(|error| NumberingError::TemplateCompile {
                        document_type,
                        error,
                    })
            }
        }
    }

    fn load_template_text(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<String> {
        self.templates
            .active_template(tenant_id, document_type)?
            .ok_or_else(|| NumberingError::TemplateNotConfigured {
                tenant_id: tenant_id.to_string(),
                document_type,
            })
    }
}

fn render(resolved: &Resolved, request: &NumberingRequest<'_>, sequence: u64) -> FormattedNumber {
    let number = resolved.template.render(&RenderContext {
        date: resolved.date,
        sequence,
        tenant_code: request.tenant_code,
    });
    FormattedNumber {
        number,
        document_type: request.document_type,
        period_key: resolved.key.period_key.clone(),
        sequence,
    }
}

fn log_failure(
    event: &str,
    request: &NumberingRequest<'_>,
    err: &NumberingError,
    started_at: Instant,
) {
    let duration_ms = started_at.elapsed().as_millis();
    if err.is_retryable() || matches!(err, NumberingError::TemplateNotConfigured { .. }) {
        warn!(
            "event={} module=numbering status=error tenant_id={} document_type={} duration_ms={} error_code={} error={}",
            event,
            request.tenant_id,
            request.document_type,
            duration_ms,
            err.error_code(),
            err
        );
    } else {
        error!(
            "event={} module=numbering status=error tenant_id={} document_type={} duration_ms={} error_code={} error={}",
            event,
            request.tenant_id,
            request.document_type,
            duration_ms,
            err.error_code(),
            err
        );
    }
}
