//! Read-through cache of compiled templates keyed by template text.
//!
//! # Invariants
//! - Entries are immutable; replacing one with an equal compilation is
//!   harmless, so population needs no coordination beyond the map lock.
//! - Compile failures are never cached.
//! - Keying by text means an edited template is a new entry; a stale entry
//!   can only be served for text that is no longer configured, and is never
//!   looked up again.

use crate::template::{compile_template, CompiledTemplate, TemplateCompileError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Distinct template texts kept before the cache is reset.
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct TemplateCache {
    entries: RwLock<HashMap<String, Arc<CompiledTemplate>>>,
    capacity: usize,
}

impl TemplateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the cached compilation of `text`, compiling it on a miss.
    pub fn get_or_compile(
        &self,
        text: &str,
    ) -> Result<Arc<CompiledTemplate>, TemplateCompileError> {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(text)
        {
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(compile_template(text)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity && !entries.contains_key(text) {
            entries.clear();
        }
        Ok(Arc::clone(
            entries.entry(text.to_string()).or_insert(compiled),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_CACHE_CAPACITY)
    }
}
