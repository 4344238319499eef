//! Numbering template settings.
//!
//! # Responsibility
//! - Expose the read-only `TemplateSource` contract consumed by the engine.
//! - Persist per-tenant templates in `numbering_templates`.
//!
//! # Invariants
//! - At most one active template per (tenant, document type).
//! - Writes compile the template first; malformed text is never stored
//!   through this repository.
//! - Stored document type codes must parse back into `DocumentType`.

use crate::db::{ensure_schema_ready, DbError};
use crate::model::document_type::DocumentType;
use crate::template::{compile_template, TemplateCompileError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{PoisonError, RwLock};

/// Template seeded for tenants created before purchase-order follow-ups
/// were numbered.
pub const DEFAULT_PURCHASE_ORDER_FOLLOWUP_TEMPLATE: &str = "PAFO-{{YYYY}}-{{SEQ:5}}";

pub type RepoResult<T> = Result<T, RepoError>;

/// Template settings persistence error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidTemplate {
        document_type: DocumentType,
        error: TemplateCompileError,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidTemplate {
                document_type,
                error,
            } => write!(f, "invalid {document_type} template: {error}"),
            Self::InvalidData(message) => write!(f, "invalid persisted template data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidTemplate { error, .. } => Some(error),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for one stored template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRecord {
    pub tenant_id: String,
    pub document_type: DocumentType,
    pub template: String,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

/// Read-only view of the settings collaborator.
pub trait TemplateSource {
    /// Returns the active template text, or `None` when not configured.
    fn active_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> RepoResult<Option<String>>;
}

impl<T: TemplateSource + ?Sized> TemplateSource for &T {
    fn active_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> RepoResult<Option<String>> {
        (**self).active_template(tenant_id, document_type)
    }
}

/// SQLite-backed template settings repository.
pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    /// Validates and stores the active template, replacing any previous one.
    ///
    /// Counters are untouched: numbering continues within the current
    /// period regardless of the new text.
    pub fn set_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        template: &str,
    ) -> RepoResult<()> {
        compile_template(template).map_err(|error| RepoError::InvalidTemplate {
            document_type,
            error,
        })?;

        self.conn.execute(
            "INSERT INTO numbering_templates (tenant_id, document_type, template)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (tenant_id, document_type) DO UPDATE SET
                template = excluded.template,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![tenant_id, document_type.as_str(), template],
        )?;

        info!(
            "event=template_set module=settings status=ok tenant_id={} document_type={}",
            tenant_id, document_type
        );
        Ok(())
    }

    /// Stores `template` only when no template exists yet.
    ///
    /// Returns `true` when a row was inserted.
    pub fn ensure_default_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        template: &str,
    ) -> RepoResult<bool> {
        compile_template(template).map_err(|error| RepoError::InvalidTemplate {
            document_type,
            error,
        })?;

        let inserted = self.conn.execute(
            "INSERT INTO numbering_templates (tenant_id, document_type, template)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (tenant_id, document_type) DO NOTHING;",
            params![tenant_id, document_type.as_str(), template],
        )?;

        if inserted > 0 {
            info!(
                "event=template_seed module=settings status=ok tenant_id={} document_type={}",
                tenant_id, document_type
            );
        }
        Ok(inserted > 0)
    }

    /// Removes the active template. Returns `false` when none existed.
    pub fn remove_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM numbering_templates WHERE tenant_id = ?1 AND document_type = ?2;",
            params![tenant_id, document_type.as_str()],
        )?;
        Ok(removed > 0)
    }

    /// Lists all templates of one tenant ordered by document type code.
    pub fn list_templates(&self, tenant_id: &str) -> RepoResult<Vec<TemplateRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT tenant_id, document_type, template, updated_at
             FROM numbering_templates
             WHERE tenant_id = ?1
             ORDER BY document_type ASC;",
        )?;
        let mut rows = stmt.query([tenant_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_template_row(row)?);
        }
        Ok(records)
    }
}

impl TemplateSource for SqliteTemplateRepository<'_> {
    fn active_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> RepoResult<Option<String>> {
        let template = self
            .conn
            .query_row(
                "SELECT template
                 FROM numbering_templates
                 WHERE tenant_id = ?1 AND document_type = ?2;",
                params![tenant_id, document_type.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(template)
    }
}

fn parse_template_row(row: &Row<'_>) -> RepoResult<TemplateRecord> {
    let code: String = row.get("document_type")?;
    let document_type = code.parse::<DocumentType>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid document type `{code}` in numbering_templates.document_type"
        ))
    })?;

    Ok(TemplateRecord {
        tenant_id: row.get("tenant_id")?,
        document_type,
        template: row.get("template")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Process-local template source for callers that keep settings elsewhere.
///
/// Unlike the SQLite repository it stores text as given, so the engine's
/// compile step is the only validation.
#[derive(Debug, Default)]
pub struct InMemoryTemplates {
    templates: RwLock<HashMap<(String, DocumentType), String>>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tenant_id: &str, document_type: DocumentType, template: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((tenant_id.to_string(), document_type), template.into());
    }

    pub fn remove(&self, tenant_id: &str, document_type: DocumentType) -> bool {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(tenant_id.to_string(), document_type))
            .is_some()
    }
}

impl TemplateSource for InMemoryTemplates {
    fn active_template(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> RepoResult<Option<String>> {
        Ok(self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(tenant_id.to_string(), document_type))
            .cloned())
    }
}
